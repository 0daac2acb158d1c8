use serde::{Deserialize, Serialize};

/// Root of the persisted dashboard document. Everything the UI renders or
/// the settings pages edit lives here; the YAML file on disk is the only
/// durable state in the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardConfig {
    pub title: String,
    pub default_columns: u8,
    pub theme: Theme,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backgrounds: Option<Backgrounds>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widgets: Option<WidgetSection>,
    pub groups: Vec<ServiceGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<Service>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: "My Dashboard".to_string(),
            default_columns: 4,
            theme: Theme::default(),
            backgrounds: None,
            widgets: None,
            groups: Vec::new(),
            services: None,
            settings: None,
        }
    }
}

/// Flat named colors. Values are CSS color strings (hex or rgba); nothing
/// beyond "is a string" is validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub main_background: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_background: Option<String>,
    pub text: String,
    pub service_background: String,
    pub service_background_hover: String,
    pub online_indicator: String,
    pub offline_indicator: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            main_background: "#111827".to_string(),
            title_background: None,
            text: "#ffffff".to_string(),
            service_background: "#1f2937".to_string(),
            service_background_hover: "#374151".to_string(),
            online_indicator: "#22c55e".to_string(),
            offline_indicator: "#ef4444".to_string(),
        }
    }
}

/// A named, ordered collection of services sharing layout defaults. The
/// group name is the de facto identity key in the editing UI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceGroup {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<u8>,
    pub services: Vec<Service>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collapsed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_align: Option<Align>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_text_color: Option<String>,
}

/// A single link tile on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ping: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ping_method: Option<PingMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local: Option<bool>,
}

impl Service {
    pub fn icon_ref(&self) -> IconRef {
        match self.icon.as_deref() {
            None | Some("") => IconRef::Unknown,
            Some(icon) if has_image_extension(icon) => IconRef::Uploaded(icon.to_string()),
            Some(icon) => IconRef::Bundled(icon.to_string()),
        }
    }
}

/// What a service's `icon` string points at, resolved once instead of
/// treating the raw string as a runtime lookup key. Filenames with an
/// image extension refer to uploaded files in the icons directory; any
/// other non-empty string names a bundled vector icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconRef {
    Bundled(String),
    Uploaded(String),
    Unknown,
}

pub fn has_image_extension(name: &str) -> bool {
    let ext = name.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "svg" | "webp" | "ico" | "gif")
}

/// Background image bookkeeping: the currently selected file plus the
/// history of everything uploaded so far, and the display modifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backgrounds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<String>,
    pub history: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier: Option<BackgroundModifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blur_amount: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vignette_amount: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixelate_amount: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSection {
    pub columns: u8,
    pub items: Vec<WidgetConfig>,
}

/// A non-link tile backed by a data source. `widget_type` discriminates
/// clock widgets (format/time zone) from weather widgets (provider,
/// location, key, units).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub widget_type: WidgetType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ClockFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<WeatherProvider>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zipcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<Units>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
}

/// Feature flags edited on the settings page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_title_backgrounds: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_blur: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_ip: Option<String>,
}

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant,)+
        }

        impl $name {
            pub const ACCEPTED: &'static [&'static str] = &[$($text),+];

            pub fn parse(s: &str) -> Option<Self> {
                match s {
                    $($text => Some(Self::$variant),)+
                    _ => None,
                }
            }

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }
    };
}

string_enum!(Align {
    Left => "left",
    Center => "center",
    Right => "right",
});

string_enum!(Layout {
    Vertical => "vertical",
    Horizontal => "horizontal",
    HorizontalReverse => "horizontal-reverse",
});

string_enum!(
    /// Reachability probe method. HEAD is the default because it is the
    /// cheapest way to ask "is anyone home".
    PingMethod {
        Head => "HEAD",
        Get => "GET",
    }
);

string_enum!(WidgetType {
    Clock => "clock",
    Weather => "weather",
});

string_enum!(ClockFormat {
    TwelveHour => "12h",
    TwentyFourHour => "24h",
});

string_enum!(WeatherProvider {
    OpenWeatherMap => "openweathermap",
    WeatherApi => "weatherapi",
});

string_enum!(Units {
    Metric => "metric",
    Imperial => "imperial",
    Standard => "standard",
});

string_enum!(BackgroundModifier {
    None => "none",
    Blur => "blur",
    Vignette => "vignette",
    Pixelate => "pixelate",
    NoWallpaper => "no-wallpaper",
});

impl Default for WidgetType {
    fn default() -> Self {
        Self::Clock
    }
}
