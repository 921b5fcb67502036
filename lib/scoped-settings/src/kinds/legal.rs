use serde::{Deserialize, Serialize};

use crate::{SettingKind, SettingType};

/// Links and contact shown on the login pages. Empty strings mean "not shown".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LegalAndSupportSettings {
    pub tos_link: String,
    pub privacy_policy_link: String,
    pub help_link: String,
    pub support_email: String,
    pub docs_link: String,
    pub custom_link: String,
    pub custom_link_text: String,
}

impl SettingKind for LegalAndSupportSettings {
    const TYPE: SettingType = SettingType::LegalAndSupport;
}

attribute_setters!(LegalAndSupportSettings {
    set_tos_link(&str) => "tosLink";
    set_privacy_policy_link(&str) => "privacyPolicyLink";
    set_help_link(&str) => "helpLink";
    set_support_email(&str) => "supportEmail";
    set_docs_link(&str) => "docsLink";
    set_custom_link(&str) => "customLink";
    set_custom_link_text(&str) => "customLinkText";
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tos_link_key() {
        let value = serde_json::to_value(LegalAndSupportSettings {
            tos_link: "https://example.com/tos".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(value["tosLink"], "https://example.com/tos");
        assert_eq!(value["customLinkText"], "");
    }
}
