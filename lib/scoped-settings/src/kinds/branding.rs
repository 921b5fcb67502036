use serde::{Deserialize, Serialize};

use crate::{SettingKind, SettingType};

attribute_enum! {
    #[derive(Default)]
    pub enum ThemeMode {
        #[default]
        Auto => "auto",
        Light => "light",
        Dark => "dark",
    }
}

/// Colors, assets and display switches of the hosted login pages.
///
/// Edited in preview and served once activated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BrandingSettings {
    pub primary_color_light: String,
    pub background_color_light: String,
    pub warn_color_light: String,
    pub font_color_light: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url_light: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url_light: Option<String>,

    pub primary_color_dark: String,
    pub background_color_dark: String,
    pub warn_color_dark: String,
    pub font_color_dark: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url_dark: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url_dark: Option<String>,

    pub hide_login_name_suffix: bool,
    pub error_message_popup: bool,
    pub disable_watermark: bool,
    pub theme_mode: ThemeMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_url: Option<String>,
}

impl SettingKind for BrandingSettings {
    const TYPE: SettingType = SettingType::Branding;
}

// `None` clears an asset URL to JSON null.
attribute_setters!(BrandingSettings {
    set_primary_color_light(&str) => "primaryColorLight";
    set_background_color_light(&str) => "backgroundColorLight";
    set_warn_color_light(&str) => "warnColorLight";
    set_font_color_light(&str) => "fontColorLight";
    set_logo_url_light(Option<&str>) => "logoUrlLight";
    set_icon_url_light(Option<&str>) => "iconUrlLight";
    set_primary_color_dark(&str) => "primaryColorDark";
    set_background_color_dark(&str) => "backgroundColorDark";
    set_warn_color_dark(&str) => "warnColorDark";
    set_font_color_dark(&str) => "fontColorDark";
    set_logo_url_dark(Option<&str>) => "logoUrlDark";
    set_icon_url_dark(Option<&str>) => "iconUrlDark";
    set_hide_login_name_suffix(bool) => "hideLoginNameSuffix";
    set_error_message_popup(bool) => "errorMessagePopup";
    set_disable_watermark(bool) => "disableWatermark";
    set_theme_mode(ThemeMode) => "themeMode";
    set_font_url(Option<&str>) => "fontUrl";
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Setting, SettingsRepository};
    use scoped_storage::{Change, Changes, JsonOp, StatementBuilder};
    use serde_json::json;

    const REPO: SettingsRepository<BrandingSettings> = SettingsRepository::new();

    #[test]
    fn clearing_an_asset_writes_null() {
        assert_eq!(
            REPO.set_logo_url_dark(None),
            Change::json(
                REPO.attributes_column(),
                ["logoUrlDark"],
                JsonOp::Set(serde_json::Value::Null)
            )
        );
    }

    #[test]
    fn patches_on_a_replaced_document_apply_in_memory() {
        let replaced = REPO
            .set_attributes(&BrandingSettings {
                primary_color_light: "#fff".into(),
                ..Default::default()
            })
            .unwrap();
        let changes = Changes::new()
            .with(replaced)
            .with(REPO.set_theme_mode(ThemeMode::Dark));
        let mut builder = StatementBuilder::new();
        changes.write_update(&mut builder).unwrap();

        assert_eq!(builder.sql(), "attributes = $1");
        let scoped_storage::Value::Json(doc) = &builder.args()[0] else {
            panic!("expected a JSON document, got {:?}", builder.args()[0]);
        };
        assert_eq!(doc["primaryColorLight"], json!("#fff"));
        assert_eq!(doc["themeMode"], json!("dark"));
    }

    #[test]
    fn unknown_theme_is_a_scan_error() {
        let row = crate::SettingRow {
            instance_id: "i1".into(),
            organization_id: None,
            id: "b1".into(),
            kind: SettingType::Branding,
            state: crate::SettingState::Preview,
            attributes: json!({"themeMode": "sepia"}),
            created_at: scoped_storage::Timestamp::now(),
            updated_at: scoped_storage::Timestamp::now(),
        };
        let err = Setting::<BrandingSettings>::try_from(row).unwrap_err();
        assert!(err.is_scan());
    }
}
