// ── Service registry and dispatch table ──
//
// Three fixed mappings:
//
//   Service name         → Service           (`resolve_service`)
//   ServiceOperation     → endpoint          (`ServiceOperation::endpoint`)
//   CommandKind          → ServiceOperation  (`CommandKind::operation`)
//
// The last one is an exhaustive match, so a command without a handler does
// not compile. Two command kinds may share an operation (`GetRelatedDatasets`
// is a narrowed `ExpandGRMRelationsForPrimary`).

use strum::{EnumIter, IntoEnumIterator};

use crate::command::CommandKind;
use crate::error::CoreError;

// ── Service ──────────────────────────────────────────────────────────

/// A server-side service grouping related operations.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString, EnumIter,
)]
pub enum Service {
    Session,
    SavedQuery,
    DataManagement,
    StructureManagement,
    RequirementsManagement,
    #[strum(serialize = "FMSClient")]
    FmsClient,
}

/// Look a service up by its name (`SavedQuery`, `FMSClient`, ...).
pub fn resolve_service(name: &str) -> Result<Service, CoreError> {
    name.parse().map_err(|_| CoreError::UndefinedService {
        name: name.to_owned(),
    })
}

impl Service {
    /// Operations this service exposes, in registry order.
    pub fn operations(self) -> impl Iterator<Item = ServiceOperation> {
        ServiceOperation::iter().filter(move |op| op.service() == self)
    }

    /// Look an operation up by API name (`findSavedQueries`) or by its
    /// snake-case form (`find_saved_queries`).
    pub fn operation(self, name: &str) -> Result<ServiceOperation, CoreError> {
        self.operations()
            .find(|op| op.name() == name || op.snake_name() == name)
            .ok_or_else(|| CoreError::UndefinedOperation {
                service: self.to_string(),
                name: name.to_owned(),
            })
    }
}

// ── ServiceOperation ─────────────────────────────────────────────────

/// Where an operation is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// JSON POST to `{base_url}{base_path}{path}`.
    Json(&'static str),
    /// Binary GET relative to the file service root.
    FileService,
}

/// One registered operation of one service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum ServiceOperation {
    Login,
    Logout,
    FindSavedQueries,
    DescribeSavedQueries,
    ExecuteSavedQuery,
    LoadObjects,
    GetProperties,
    GetItemFromId,
    ExpandGrmRelationsForPrimary,
    CreateAttachAndSubmitObjects,
    CreateDatasets2,
    CreateBomWindows,
    ExpandPsAllLevels,
    GetRevisionRules,
    ExportToApplication3,
    CreateTracelinks,
    DownloadFile,
}

impl ServiceOperation {
    pub const fn service(self) -> Service {
        match self {
            Self::Login | Self::Logout => Service::Session,
            Self::FindSavedQueries | Self::DescribeSavedQueries | Self::ExecuteSavedQuery => {
                Service::SavedQuery
            }
            Self::LoadObjects
            | Self::GetProperties
            | Self::GetItemFromId
            | Self::ExpandGrmRelationsForPrimary
            | Self::CreateAttachAndSubmitObjects
            | Self::CreateDatasets2 => Service::DataManagement,
            Self::CreateBomWindows | Self::ExpandPsAllLevels | Self::GetRevisionRules => {
                Service::StructureManagement
            }
            Self::ExportToApplication3 | Self::CreateTracelinks => Service::RequirementsManagement,
            Self::DownloadFile => Service::FmsClient,
        }
    }

    pub const fn endpoint(self) -> Endpoint {
        match self {
            Self::Login => Endpoint::Json("Core-2011-06-Session/login"),
            Self::Logout => Endpoint::Json("Core-2006-03-Session/logout"),
            Self::FindSavedQueries => Endpoint::Json("Query-2010-04-SavedQuery/findSavedQueries"),
            Self::DescribeSavedQueries => {
                Endpoint::Json("Query-2006-03-SavedQuery/describeSavedQueries")
            }
            Self::ExecuteSavedQuery => Endpoint::Json("Query-2006-03-SavedQuery/executeSavedQuery"),
            Self::LoadObjects => Endpoint::Json("Core-2007-09-DataManagement/loadObjects"),
            Self::GetProperties => Endpoint::Json("Core-2006-03-DataManagement/getProperties"),
            Self::GetItemFromId => Endpoint::Json("Core-2007-01-DataManagement/getItemFromId"),
            Self::ExpandGrmRelationsForPrimary => {
                Endpoint::Json("Core-2007-09-DataManagement/expandGRMRelationsForPrimary")
            }
            Self::CreateAttachAndSubmitObjects => {
                Endpoint::Json("Core-2016-09-DataManagement/createAttachAndSubmitObjects")
            }
            Self::CreateDatasets2 => Endpoint::Json("Core-2008-06-DataManagement/createDatasets2"),
            Self::CreateBomWindows => {
                Endpoint::Json("Cad-2007-01-StructureManagement/createBOMWindows")
            }
            Self::ExpandPsAllLevels => {
                Endpoint::Json("Cad-2007-01-StructureManagement/expandPSAllLevels")
            }
            Self::GetRevisionRules => {
                Endpoint::Json("Cad-2007-01-StructureManagement/getRevisionRules")
            }
            Self::ExportToApplication3 => {
                Endpoint::Json("Internal-AWS2-2017-06-RequirementsManagement/exportToApplication3")
            }
            Self::CreateTracelinks => {
                Endpoint::Json("AWS2-2018-12-RequirementsManagement/createTracelinks")
            }
            Self::DownloadFile => Endpoint::FileService,
        }
    }

    /// API name as it appears in the endpoint path.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Logout => "logout",
            Self::FindSavedQueries => "findSavedQueries",
            Self::DescribeSavedQueries => "describeSavedQueries",
            Self::ExecuteSavedQuery => "executeSavedQuery",
            Self::LoadObjects => "loadObjects",
            Self::GetProperties => "getProperties",
            Self::GetItemFromId => "getItemFromId",
            Self::ExpandGrmRelationsForPrimary => "expandGRMRelationsForPrimary",
            Self::CreateAttachAndSubmitObjects => "createAttachAndSubmitObjects",
            Self::CreateDatasets2 => "createDatasets2",
            Self::CreateBomWindows => "createBOMWindows",
            Self::ExpandPsAllLevels => "expandPSAllLevels",
            Self::GetRevisionRules => "getRevisionRules",
            Self::ExportToApplication3 => "exportToApplication3",
            Self::CreateTracelinks => "createTracelinks",
            Self::DownloadFile => "downloadFile",
        }
    }

    pub const fn snake_name(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Logout => "logout",
            Self::FindSavedQueries => "find_saved_queries",
            Self::DescribeSavedQueries => "describe_saved_queries",
            Self::ExecuteSavedQuery => "execute_saved_query",
            Self::LoadObjects => "load_objects",
            Self::GetProperties => "get_properties",
            Self::GetItemFromId => "get_item_from_id",
            Self::ExpandGrmRelationsForPrimary => "expand_grm_relations_for_primary",
            Self::CreateAttachAndSubmitObjects => "create_attach_and_submit_objects",
            Self::CreateDatasets2 => "create_datasets2",
            Self::CreateBomWindows => "create_bom_windows",
            Self::ExpandPsAllLevels => "expand_ps_all_levels",
            Self::GetRevisionRules => "get_revision_rules",
            Self::ExportToApplication3 => "export_to_application3",
            Self::CreateTracelinks => "create_tracelinks",
            Self::DownloadFile => "download_file",
        }
    }
}

impl std::fmt::Display for ServiceOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.service(), self.snake_name())
    }
}

// ── Dispatch table ───────────────────────────────────────────────────

impl CommandKind {
    /// The one service operation authorized to send this command.
    pub const fn operation(self) -> ServiceOperation {
        match self {
            Self::Login => ServiceOperation::Login,
            Self::Logout => ServiceOperation::Logout,
            Self::FindSavedQuery => ServiceOperation::FindSavedQueries,
            Self::DescribeSavedQueries => ServiceOperation::DescribeSavedQueries,
            Self::ExecuteSavedQuery => ServiceOperation::ExecuteSavedQuery,
            Self::LoadObjects => ServiceOperation::LoadObjects,
            Self::GetProperties => ServiceOperation::GetProperties,
            Self::GetItemFromId => ServiceOperation::GetItemFromId,
            Self::ExpandGRMRelationsForPrimary | Self::GetRelatedDatasets => {
                ServiceOperation::ExpandGrmRelationsForPrimary
            }
            Self::CreateAndRelateDataset => ServiceOperation::CreateDatasets2,
            Self::CreateBOMWindow => ServiceOperation::CreateBomWindows,
            Self::ExpandPSAllLevels => ServiceOperation::ExpandPsAllLevels,
            Self::GetRevisionRule => ServiceOperation::GetRevisionRules,
            Self::CreateTraceLinks => ServiceOperation::CreateTracelinks,
            Self::GetHTML => ServiceOperation::ExportToApplication3,
            Self::DownloadFile => ServiceOperation::DownloadFile,
            Self::CreateItem => ServiceOperation::CreateAttachAndSubmitObjects,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn every_service_resolves_by_name() {
        for service in Service::iter() {
            assert_eq!(resolve_service(&service.to_string()).unwrap(), service);
        }
        assert_eq!(resolve_service("FMSClient").unwrap(), Service::FmsClient);
    }

    #[test]
    fn unknown_service_is_a_configuration_error() {
        let err = resolve_service("Workflow").unwrap_err();
        assert!(matches!(err, CoreError::UndefinedService { ref name } if name == "Workflow"));
        assert!(err.is_configuration());
    }

    #[test]
    fn json_endpoints_are_unique_and_belong_to_their_service() {
        let mut seen = HashSet::new();
        for op in ServiceOperation::iter() {
            if let Endpoint::Json(path) = op.endpoint() {
                assert!(seen.insert(path), "duplicate endpoint {path}");
                let (prefix, api) = path.rsplit_once('/').unwrap();
                assert_eq!(api, op.name());
                assert!(
                    prefix.ends_with(&format!("-{}", op.service())),
                    "{path} is not under {}",
                    op.service()
                );
            }
        }
    }

    #[test]
    fn operations_resolve_by_api_and_snake_name() {
        let op = Service::SavedQuery.operation("findSavedQueries").unwrap();
        assert_eq!(op, ServiceOperation::FindSavedQueries);
        assert_eq!(
            Service::SavedQuery.operation("find_saved_queries").unwrap(),
            op
        );
        assert_eq!(
            Service::FmsClient.operation("download_file").unwrap(),
            ServiceOperation::DownloadFile
        );
        assert!(matches!(
            Service::Session.operation("findSavedQueries"),
            Err(CoreError::UndefinedOperation { .. })
        ));
    }

    #[test]
    fn dispatch_table_is_total() {
        for kind in CommandKind::iter() {
            let op = kind.operation();
            assert!(
                op.service().operations().any(|o| o == op),
                "{kind} maps to {op}, which its service does not expose"
            );
        }
    }

    #[test]
    fn only_download_goes_to_the_file_service() {
        for kind in CommandKind::iter() {
            let is_fms = kind.operation().endpoint() == Endpoint::FileService;
            assert_eq!(is_fms, kind == CommandKind::DownloadFile, "{kind}");
        }
    }
}
