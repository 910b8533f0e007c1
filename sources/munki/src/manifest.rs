//! Manifests describe the software a munki client should have.  The manifest module holds the
//! manifest types and the partial-update merge used by PATCH requests.

use crate::payload::Field;
use serde::{Deserialize, Serialize};
use std::slice;

/// The install lists shared by a manifest and each of its conditional items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestItems {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub optional_installs: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub managed_installs: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub managed_uninstalls: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub managed_updates: Vec<String>,
}

/// A block of install lists that only applies to clients for which the `condition` predicate
/// (an NSPredicate string, evaluated on the client) is true.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub condition: String,

    #[serde(flatten)]
    pub items: ManifestItems,
}

/// Manifest represents a munki manifest as it's stored in the repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    // The path of the manifest relative to the manifests directory; it's the identity of the
    // manifest rather than part of its contents.
    #[serde(skip)]
    pub filename: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub catalogs: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included_manifests: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditional_items: Vec<Condition>,

    #[serde(flatten)]
    pub items: ManifestItems,
}

impl Manifest {
    pub fn new<S: Into<String>>(filename: S) -> Self {
        Manifest {
            filename: filename.into(),
            ..Default::default()
        }
    }

    /// Applies a partial update.  Every field that's set in the payload replaces the matching
    /// manifest field outright, even if the new value is empty; fields that aren't set are left
    /// alone.  Lists are replaced, never appended to or merged item by item.
    pub fn update_from_payload(&mut self, payload: ManifestPayload) {
        let ManifestPayload {
            catalogs,
            display_name,
            included_manifests,
            optional_installs,
            managed_installs,
            managed_uninstalls,
            managed_updates,
            notes,
            user,
            conditional_items,
        } = payload;

        catalogs.apply_to(&mut self.catalogs);
        display_name.apply_to(&mut self.display_name);
        included_manifests.apply_to(&mut self.included_manifests);
        optional_installs.apply_to(&mut self.items.optional_installs);
        managed_installs.apply_to(&mut self.items.managed_installs);
        managed_uninstalls.apply_to(&mut self.items.managed_uninstalls);
        managed_updates.apply_to(&mut self.items.managed_updates);
        notes.apply_to(&mut self.notes);
        user.apply_to(&mut self.user);
        conditional_items.apply_to(&mut self.conditional_items);
    }
}

/// ManifestPayload is a sparse description of changes to a Manifest; see `Field`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestPayload {
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub catalogs: Field<Vec<String>>,

    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub display_name: Field<String>,

    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub included_manifests: Field<Vec<String>>,

    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub optional_installs: Field<Vec<String>>,

    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub managed_installs: Field<Vec<String>>,

    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub managed_uninstalls: Field<Vec<String>>,

    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub managed_updates: Field<Vec<String>>,

    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub notes: Field<String>,

    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub user: Field<String>,

    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub conditional_items: Field<Vec<Condition>>,
}

/// An ordered list of manifests, in whatever order the store returns them.
///
/// This deliberately doesn't implement Serialize; API responses go through the collection's
/// subset instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestCollection {
    manifests: Vec<Manifest>,
}

impl ManifestCollection {
    pub fn new(manifests: Vec<Manifest>) -> Self {
        ManifestCollection { manifests }
    }

    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Manifest> {
        self.manifests.iter()
    }

    pub fn as_slice(&self) -> &[Manifest] {
        &self.manifests
    }
}

impl FromIterator<Manifest> for ManifestCollection {
    fn from_iter<I: IntoIterator<Item = Manifest>>(iter: I) -> Self {
        ManifestCollection::new(iter.into_iter().collect())
    }
}

impl IntoIterator for ManifestCollection {
    type Item = Manifest;
    type IntoIter = std::vec::IntoIter<Manifest>;

    fn into_iter(self) -> Self::IntoIter {
        self.manifests.into_iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    static SITE_DEFAULT: &str = include_str!("../tests/data/site_default.plist");

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn populated() -> Manifest {
        Manifest {
            filename: "site_default".to_string(),
            catalogs: strings(&["production", "testing"]),
            display_name: "Site Default".to_string(),
            included_manifests: strings(&["common"]),
            notes: "for every client".to_string(),
            user: "admin".to_string(),
            conditional_items: vec![Condition {
                condition: "machine_type == \"laptop\"".to_string(),
                items: ManifestItems {
                    managed_installs: strings(&["VPNClient"]),
                    ..Default::default()
                },
            }],
            items: ManifestItems {
                optional_installs: strings(&["Firefox"]),
                managed_installs: strings(&["Office"]),
                managed_uninstalls: strings(&["OldThing"]),
                managed_updates: strings(&["Chrome"]),
            },
        }
    }

    #[test]
    fn empty_payload_is_identity() {
        let mut manifest = populated();
        manifest.update_from_payload(ManifestPayload::default());
        assert_eq!(manifest, populated());
    }

    #[test]
    fn single_field_overwrites_only_that_field() {
        let mut manifest = populated();
        manifest.update_from_payload(ManifestPayload {
            notes: Field::Set("updated".to_string()),
            ..Default::default()
        });

        let mut expected = populated();
        expected.notes = "updated".to_string();
        assert_eq!(manifest, expected);
    }

    #[test]
    fn empty_values_clear_fields() {
        let mut manifest = populated();
        manifest.update_from_payload(ManifestPayload {
            catalogs: Field::Set(vec![]),
            display_name: Field::Set(String::new()),
            conditional_items: Field::Set(vec![]),
            managed_updates: Field::Set(vec![]),
            ..Default::default()
        });

        let mut expected = populated();
        expected.catalogs.clear();
        expected.display_name.clear();
        expected.conditional_items.clear();
        expected.items.managed_updates.clear();
        assert_eq!(manifest, expected);
    }

    #[test]
    fn lists_are_replaced_not_appended() {
        let mut manifest = populated();
        manifest.update_from_payload(ManifestPayload {
            managed_installs: Field::Set(strings(&["Slack"])),
            ..Default::default()
        });
        assert_eq!(manifest.items.managed_installs, strings(&["Slack"]));
        assert_eq!(manifest.items.optional_installs, strings(&["Firefox"]));
    }

    #[test]
    fn every_field_is_applied() {
        let mut manifest = Manifest::new("blank");
        let source = populated();
        manifest.update_from_payload(ManifestPayload {
            catalogs: Field::Set(source.catalogs.clone()),
            display_name: Field::Set(source.display_name.clone()),
            included_manifests: Field::Set(source.included_manifests.clone()),
            optional_installs: Field::Set(source.items.optional_installs.clone()),
            managed_installs: Field::Set(source.items.managed_installs.clone()),
            managed_uninstalls: Field::Set(source.items.managed_uninstalls.clone()),
            managed_updates: Field::Set(source.items.managed_updates.clone()),
            notes: Field::Set(source.notes.clone()),
            user: Field::Set(source.user.clone()),
            conditional_items: Field::Set(source.conditional_items.clone()),
        });

        // Everything but the identity comes from the payload.
        assert_eq!(manifest.filename, "blank");
        manifest.filename = source.filename.clone();
        assert_eq!(manifest, source);
    }

    #[test]
    fn patch_notes_keeps_catalogs() {
        let mut manifest = Manifest::new("m");
        manifest.catalogs = strings(&["prod"]);

        let payload: ManifestPayload = serde_json::from_str(r#"{"notes": "updated"}"#).unwrap();
        manifest.update_from_payload(payload);

        assert_eq!(manifest.notes, "updated");
        assert_eq!(manifest.catalogs, strings(&["prod"]));
    }

    #[test]
    fn empty_fields_are_not_serialized() {
        let json = serde_json::to_value(Manifest::new("hidden")).unwrap();
        assert_eq!(json, serde_json::json!({}));

        let mut manifest = Manifest::new("hidden");
        manifest.items.managed_installs = strings(&["Office"]);
        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(json, serde_json::json!({"managed_installs": ["Office"]}));
    }

    #[test]
    fn condition_always_has_predicate() {
        let json = serde_json::to_value(Condition::default()).unwrap();
        assert_eq!(json, serde_json::json!({"condition": ""}));
    }

    #[test]
    fn reads_repository_plist() {
        let manifest: Manifest = plist::from_bytes(SITE_DEFAULT.as_bytes()).unwrap();
        assert_eq!(manifest.filename, "");
        assert_eq!(manifest.catalogs, strings(&["production"]));
        assert_eq!(manifest.display_name, "Site Default");
        assert_eq!(manifest.items.managed_installs, strings(&["Office", "Chrome"]));
        assert_eq!(manifest.conditional_items.len(), 1);
        assert_eq!(
            manifest.conditional_items[0].items.optional_installs,
            strings(&["Xcode"])
        );
    }
}
