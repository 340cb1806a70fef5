use serde::{Deserialize, Serialize};

use super::CredentialSize;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub general: GeneralSettings,
    pub printing: PrintingSettings,
    pub notifications: NotificationSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneralSettings {
    pub app_name: String,
    pub default_credential_size: CredentialSize,
    pub auto_save: bool,
    pub show_preview: bool,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            app_name: "CredPrint Pro".to_string(),
            default_credential_size: CredentialSize::Standard,
            auto_save: true,
            show_preview: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintQuality {
    #[default]
    High,
    Medium,
    Draft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaperSize {
    #[default]
    A4,
    Letter,
    Legal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrintingSettings {
    pub default_printer: String,
    pub print_quality: PrintQuality,
    pub paper_size: PaperSize,
    pub orientation: Orientation,
}

impl Default for PrintingSettings {
    fn default() -> Self {
        Self {
            default_printer: "default".to_string(),
            print_quality: PrintQuality::High,
            paper_size: PaperSize::A4,
            orientation: Orientation::Portrait,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettings {
    pub email_notifications: bool,
    pub print_notifications: bool,
    pub error_notifications: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email_notifications: true,
            print_notifications: true,
            error_notifications: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_sections_fall_back_to_defaults() {
        let settings: AppSettings =
            serde_json::from_str(r#"{"printing": {"paperSize": "Letter"}}"#).unwrap();
        assert_eq!(settings.printing.paper_size, PaperSize::Letter);
        assert_eq!(settings.printing.default_printer, "default");
        assert_eq!(settings.general, GeneralSettings::default());
        assert!(settings.notifications.error_notifications);
    }

    #[test]
    fn test_wire_names() {
        let json = serde_json::to_value(AppSettings::default()).unwrap();
        assert_eq!(json["general"]["appName"], "CredPrint Pro");
        assert_eq!(json["general"]["defaultCredentialSize"], "standard");
        assert_eq!(json["printing"]["printQuality"], "high");
        assert_eq!(json["printing"]["paperSize"], "A4");
    }
}
