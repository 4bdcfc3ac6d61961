// ── Specification contents ──
//
// SPEC_ID_REV
//   → GetItemFromId       (the specification revision)
//   → GetRevisionRule     ("Latest Working"; none is passed on as null)
//   → CreateBOMWindow     (structure window rooted at the revision)
//   → ExpandPSAllLevels   (flat parent → children table + object pool)
//   → GetHTML             (all requirement/paragraph text, cached)
//   → pre-order walk      (labels, depths, locations)

use std::collections::HashSet;
use std::path::Path;

use tracing::{error, info};

use crate::cache::HtmlTextCache;
use crate::command::{
    CommandKind, CreateBOMWindow, ExpandPSAllLevels, GetItemFromId, GetRevisionRule,
    StructureExpansion, TcCommand,
};
use crate::connection::Connection;
use crate::error::CoreError;
use crate::html::cache_html;
use crate::model::{ItemRevisionId, ModelObject, SpecContents, display_name};

/// Revision rule the structure is configured with.
pub const REVISION_RULE: &str = "Latest Working";

/// Whether an object of this type carries requirement text.
pub fn is_content_type(type_name: &str) -> bool {
    type_name.contains("Requirement Revision") || type_name.contains("Paragraph Revision")
}

/// Resolve a specification into its pre-order contents, caching the HTML
/// of every requirement and paragraph on the way.
///
/// Any failure is logged and returned; nothing partial is produced.
pub async fn get_contents(
    connection: &mut Connection,
    html_cache: &mut HtmlTextCache,
    image_root: &Path,
    spec: &ItemRevisionId,
) -> Result<SpecContents, CoreError> {
    let result = fetch_contents(connection, html_cache, image_root, spec).await;
    if let Err(ref e) = result {
        error!(
            spec = %spec,
            error = %e,
            chain = ?e.chain(),
            "failed to get specification contents"
        );
    }
    result
}

async fn fetch_contents(
    connection: &mut Connection,
    html_cache: &mut HtmlTextCache,
    image_root: &Path,
    spec: &ItemRevisionId,
) -> Result<SpecContents, CoreError> {
    let spec_revision = GetItemFromId::new(&spec.item_id, &spec.revision)
        .send(connection)
        .await?;
    let rule = GetRevisionRule::new(REVISION_RULE).send(connection).await?;
    if rule.is_none() {
        info!(rule = REVISION_RULE, "revision rule not found, using server default");
    }

    info!(spec = %spec, "retrieving specification structure");
    let bom_line = CreateBOMWindow::new(spec_revision.clone(), rule)
        .send(connection)
        .await?;
    let expansion = ExpandPSAllLevels::new(bom_line).send(connection).await?;

    let mut content: Vec<ModelObject> = expansion
        .objects
        .values()
        .filter(|obj| is_content_type(&obj.type_name))
        .cloned()
        .collect();
    content.sort_by(|a, b| a.uid.cmp(&b.uid));

    info!(count = content.len(), "retrieving text for contents");
    cache_html(connection, html_cache, &content, image_root).await?;

    walk(&spec_revision.uid, &expansion)
}

/// Flatten the relation table below `root_uid` in pre-order.
///
/// Depth 0 is the root's immediate children. A uid that is its own
/// ancestor fails with [`CoreError::MalformedStructure`].
pub fn walk(root_uid: &str, expansion: &StructureExpansion) -> Result<SpecContents, CoreError> {
    let mut contents = SpecContents::default();
    let mut ancestors = HashSet::from([root_uid.to_owned()]);
    visit(root_uid, 0, expansion, &mut ancestors, &mut contents)?;
    Ok(contents)
}

fn visit(
    parent_uid: &str,
    depth: usize,
    expansion: &StructureExpansion,
    ancestors: &mut HashSet<String>,
    contents: &mut SpecContents,
) -> Result<(), CoreError> {
    for child_uid in expansion.children_of(parent_uid) {
        if !ancestors.insert(child_uid.clone()) {
            return Err(CoreError::MalformedStructure {
                uid: child_uid.clone(),
            });
        }

        let child = expansion.objects.get(child_uid).ok_or_else(|| {
            CoreError::decode(
                CommandKind::ExpandPSAllLevels,
                format!("child {child_uid} missing from modelObjects"),
            )
        })?;
        let object_string = child.object_string().unwrap_or_default();
        contents.push(
            display_name(object_string),
            depth,
            ItemRevisionId::from_object_string(object_string).to_string(),
        );

        visit(child_uid, depth + 1, expansion, ancestors, contents)?;
        ancestors.remove(child_uid);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::command::StructureRelation;
    use crate::model::{ModelObject, ObjectPool, Property};

    fn object(uid: &str, object_string: &str) -> ModelObject {
        let mut obj = ModelObject::reference(uid, "Requirement Revision");
        obj.props.insert(
            "object_string".into(),
            Property {
                ui_values: vec![object_string.into()],
                ..Property::default()
            },
        );
        obj
    }

    fn relation(parent: &str, children: &[&str]) -> StructureRelation {
        StructureRelation {
            parent: Some(parent.into()),
            children: children.iter().map(|c| (*c).to_owned()).collect(),
        }
    }

    fn expansion(relations: Vec<StructureRelation>, objects: Vec<ModelObject>) -> StructureExpansion {
        StructureExpansion {
            relations,
            objects: objects
                .into_iter()
                .map(|o| (o.uid.clone(), o))
                .collect::<ObjectPool>(),
        }
    }

    #[test]
    fn pre_order_with_depths() {
        let tree = expansion(
            vec![
                relation("spec", &["p1", "p2"]),
                relation("p1", &["r11", "r12"]),
                relation("r11", &["r111"]),
            ],
            vec![
                object("p1", "P-1/A;1-Scope"),
                object("r11", "R-11/A;1.1-Brakes"),
                object("r111", "R-111/B;1.1.1-Front"),
                object("r12", "R-12/A;1.2-Steering"),
                object("p2", "P-2/A;2-Annex"),
            ],
        );

        let contents = walk("spec", &tree).unwrap();
        assert_eq!(
            contents.labels,
            vec!["Scope", "Brakes", "Front", "Steering", "Annex"]
        );
        assert_eq!(contents.depths, vec![0, 1, 2, 1, 0]);
        assert_eq!(
            contents.locations,
            vec!["P-1_A", "R-11_A", "R-111_B", "R-12_A", "P-2_A"]
        );
    }

    #[test]
    fn root_without_children_is_empty() {
        let contents = walk("spec", &StructureExpansion::default()).unwrap();
        assert!(contents.is_empty());
    }

    #[test]
    fn cycle_is_malformed() {
        let tree = expansion(
            vec![relation("spec", &["a"]), relation("a", &["b"]), relation("b", &["a"])],
            vec![object("a", "A/A;1-a"), object("b", "B/A;2-b")],
        );
        assert!(matches!(
            walk("spec", &tree),
            Err(CoreError::MalformedStructure { ref uid }) if uid == "a"
        ));
    }

    #[test]
    fn shared_child_in_two_branches_is_not_a_cycle() {
        let tree = expansion(
            vec![relation("spec", &["a", "b"]), relation("a", &["c"]), relation("b", &["c"])],
            vec![object("a", "A/A;1-a"), object("b", "B/A;2-b"), object("c", "C/A;3-c")],
        );
        let contents = walk("spec", &tree).unwrap();
        assert_eq!(contents.locations, vec!["A_A", "C_A", "B_A", "C_A"]);
    }

    #[test]
    fn content_types() {
        assert!(is_content_type("Requirement Revision"));
        assert!(is_content_type("Paragraph Revision"));
        assert!(!is_content_type("Requirement Specification Revision"));
        assert!(!is_content_type("BOMLine"));
    }
}
