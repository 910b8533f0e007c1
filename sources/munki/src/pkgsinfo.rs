//! Package descriptors ("pkginfo" files) tell munki clients how to install and remove an item.

use serde::{Deserialize, Serialize};
use std::slice;

/// A package receipt that munki checks to decide whether an item is installed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub packageid: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub filename: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

/// Pkgsinfo represents a munki pkginfo file as it's stored in the repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pkgsinfo {
    // Path relative to the pkgsinfo directory; identity, not content.
    #[serde(skip)]
    pub filename: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub category: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub developer: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub catalogs: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub installer_type: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub installer_item_location: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub installer_item_hash: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installer_item_size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_size: Option<u64>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub minimum_os_version: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub update_for: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub receipts: Vec<Receipt>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unattended_install: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unattended_uninstall: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uninstallable: Option<bool>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uninstall_method: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoremove: Option<bool>,
}

impl Pkgsinfo {
    pub fn new<S: Into<String>>(filename: S) -> Self {
        Pkgsinfo {
            filename: filename.into(),
            ..Default::default()
        }
    }
}

/// An ordered list of package descriptors.  Like ManifestCollection, only its subset is
/// serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PkgsinfoCollection {
    pkgsinfos: Vec<Pkgsinfo>,
}

impl PkgsinfoCollection {
    pub fn new(pkgsinfos: Vec<Pkgsinfo>) -> Self {
        PkgsinfoCollection { pkgsinfos }
    }

    pub fn len(&self) -> usize {
        self.pkgsinfos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pkgsinfos.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Pkgsinfo> {
        self.pkgsinfos.iter()
    }

    pub fn as_slice(&self) -> &[Pkgsinfo] {
        &self.pkgsinfos
    }
}

impl FromIterator<Pkgsinfo> for PkgsinfoCollection {
    fn from_iter<I: IntoIterator<Item = Pkgsinfo>>(iter: I) -> Self {
        PkgsinfoCollection::new(iter.into_iter().collect())
    }
}

impl IntoIterator for PkgsinfoCollection {
    type Item = Pkgsinfo;
    type IntoIter = std::vec::IntoIter<Pkgsinfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.pkgsinfos.into_iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    static FIREFOX: &str = include_str!("../tests/data/firefox.plist");

    #[test]
    fn reads_repository_plist() {
        let pkgsinfo: Pkgsinfo = plist::from_bytes(FIREFOX.as_bytes()).unwrap();
        assert_eq!(pkgsinfo.name, "Firefox");
        assert_eq!(pkgsinfo.version, "120.0");
        assert_eq!(pkgsinfo.installer_item_size, Some(131072));
        assert_eq!(pkgsinfo.unattended_install, Some(true));
        assert_eq!(pkgsinfo.autoremove, Some(false));
        assert_eq!(pkgsinfo.receipts.len(), 1);
        assert_eq!(pkgsinfo.receipts[0].packageid, "org.mozilla.firefox");
        assert_eq!(pkgsinfo.receipts[0].installed_size, None);
    }

    #[test]
    fn empty_fields_are_not_serialized() {
        let mut pkgsinfo = Pkgsinfo::new("apps/Firefox-120.0.plist");
        pkgsinfo.name = "Firefox".to_string();
        pkgsinfo.uninstallable = Some(false);
        let json = serde_json::to_value(&pkgsinfo).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "Firefox", "uninstallable": false})
        );
    }
}
