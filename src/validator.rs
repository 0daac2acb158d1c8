//! Shape validation for the dashboard document.
//!
//! Takes arbitrary parsed YAML/JSON and produces a fully-defaulted
//! [`DashboardConfig`], or a list of field-path-qualified errors when a
//! present value cannot be coerced. Unknown keys are ignored so that a
//! config written by a newer or older build still loads.

use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::models::{
    Align, BackgroundModifier, Backgrounds, ClockFormat, DashboardConfig, Layout, PingMethod,
    Service, ServiceGroup, Settings, Theme, Units, WeatherProvider, WidgetConfig, WidgetSection,
    WidgetType,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid configuration: {}", render(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

fn render(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.path, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validate a raw document. All errors are collected in one pass rather
/// than stopping at the first, so a bad save reports every offending
/// field at once.
pub fn validate(raw: &Value) -> Result<DashboardConfig, ValidationError> {
    let mut errors = Vec::new();
    let empty = Mapping::new();
    let map = match raw {
        Value::Null => &empty,
        Value::Mapping(m) => m,
        _ => {
            push(&mut errors, "$", "expected a mapping at the document root");
            return Err(ValidationError { errors });
        }
    };

    let mut doc = DashboardConfig::default();

    if let Some(v) = field(map, "title") {
        if let Some(s) = as_string(v, "title", &mut errors) {
            doc.title = s;
        }
    }
    if let Some(v) = field(map, "defaultColumns") {
        if let Some(n) = as_columns(v, "defaultColumns", &mut errors) {
            doc.default_columns = n;
        }
    }
    if let Some(v) = field(map, "theme") {
        doc.theme = theme(v, "theme", &mut errors);
    }
    if let Some(v) = field(map, "backgrounds") {
        doc.backgrounds = Some(backgrounds(v, "backgrounds", &mut errors));
    }
    if let Some(v) = field(map, "widgets") {
        doc.widgets = Some(widget_section(v, "widgets", &mut errors));
    }
    if let Some(v) = field(map, "groups") {
        doc.groups = list(v, "groups", &mut errors, group);
    }
    if let Some(v) = field(map, "services") {
        doc.services = Some(list(v, "services", &mut errors, service));
    }
    if let Some(v) = field(map, "settings") {
        doc.settings = Some(settings(v, "settings", &mut errors));
    }

    if errors.is_empty() {
        Ok(doc)
    } else {
        Err(ValidationError { errors })
    }
}

fn theme(v: &Value, path: &str, errors: &mut Vec<FieldError>) -> Theme {
    let mut out = Theme::default();
    let Some(map) = as_mapping(v, path, errors) else {
        return out;
    };
    set_string(map, "mainBackground", path, errors, |s| out.main_background = s);
    set_string(map, "text", path, errors, |s| out.text = s);
    set_string(map, "serviceBackground", path, errors, |s| out.service_background = s);
    set_string(map, "serviceBackgroundHover", path, errors, |s| {
        out.service_background_hover = s
    });
    set_string(map, "onlineIndicator", path, errors, |s| out.online_indicator = s);
    set_string(map, "offlineIndicator", path, errors, |s| out.offline_indicator = s);
    out.title_background = opt_string(map, "titleBackground", path, errors);
    out
}

fn backgrounds(v: &Value, path: &str, errors: &mut Vec<FieldError>) -> Backgrounds {
    let mut out = Backgrounds::default();
    let Some(map) = as_mapping(v, path, errors) else {
        return out;
    };
    out.active = opt_string(map, "active", path, errors);
    if let Some(v) = field(map, "history") {
        out.history = list(v, &join(path, "history"), errors, |v, p, e| {
            as_string(v, p, e).unwrap_or_default()
        });
    }
    out.modifier = opt_enum(
        map,
        "modifier",
        path,
        errors,
        BackgroundModifier::parse,
        BackgroundModifier::ACCEPTED,
    );
    out.blur_amount = opt_uint(map, "blurAmount", path, errors);
    out.vignette_amount = opt_uint(map, "vignetteAmount", path, errors);
    out.pixelate_amount = opt_uint(map, "pixelateAmount", path, errors);
    out
}

fn widget_section(v: &Value, path: &str, errors: &mut Vec<FieldError>) -> WidgetSection {
    let mut out = WidgetSection {
        columns: 1,
        items: Vec::new(),
    };
    let Some(map) = as_mapping(v, path, errors) else {
        return out;
    };
    if let Some(v) = field(map, "columns") {
        if let Some(n) = as_columns(v, &join(path, "columns"), errors) {
            out.columns = n;
        }
    }
    if let Some(v) = field(map, "items") {
        out.items = list(v, &join(path, "items"), errors, widget);
    }
    out
}

fn widget(v: &Value, path: &str, errors: &mut Vec<FieldError>) -> WidgetConfig {
    let mut out = WidgetConfig::default();
    let Some(map) = as_mapping(v, path, errors) else {
        return out;
    };
    out.name = required_string(map, "name", path, errors);
    if let Some(t) = req_enum(map, "type", path, errors, WidgetType::parse, WidgetType::ACCEPTED) {
        out.widget_type = t;
    }
    out.format = opt_enum(map, "format", path, errors, ClockFormat::parse, ClockFormat::ACCEPTED);
    out.time_zone = opt_string(map, "timeZone", path, errors);
    out.provider = opt_enum(
        map,
        "provider",
        path,
        errors,
        WeatherProvider::parse,
        WeatherProvider::ACCEPTED,
    );
    out.city = opt_string(map, "city", path, errors);
    out.state = opt_string(map, "state", path, errors);
    out.zipcode = opt_string(map, "zipcode", path, errors);
    out.country = opt_string(map, "country", path, errors);
    out.api_key = opt_string(map, "apiKey", path, errors);
    out.units = opt_enum(map, "units", path, errors, Units::parse, Units::ACCEPTED);
    out.background_color = opt_string(map, "backgroundColor", path, errors);
    out.text_color = opt_string(map, "textColor", path, errors);
    out
}

fn group(v: &Value, path: &str, errors: &mut Vec<FieldError>) -> ServiceGroup {
    let mut out = ServiceGroup::default();
    let Some(map) = as_mapping(v, path, errors) else {
        return out;
    };
    out.name = required_string(map, "name", path, errors);
    if let Some(v) = field(map, "columns") {
        out.columns = as_columns(v, &join(path, "columns"), errors);
    }
    if let Some(v) = field(map, "services") {
        out.services = list(v, &join(path, "services"), errors, service);
    }
    out.align = opt_enum(map, "align", path, errors, Align::parse, Align::ACCEPTED);
    out.layout = opt_enum(map, "layout", path, errors, Layout::parse, Layout::ACCEPTED);
    out.collapsed = opt_bool(map, "collapsed", path, errors);
    out.title_align = opt_enum(map, "titleAlign", path, errors, Align::parse, Align::ACCEPTED);
    out.title_background_color = opt_string(map, "titleBackgroundColor", path, errors);
    out.title_text_color = opt_string(map, "titleTextColor", path, errors);
    out
}

fn service(v: &Value, path: &str, errors: &mut Vec<FieldError>) -> Service {
    let mut out = Service::default();
    let Some(map) = as_mapping(v, path, errors) else {
        return out;
    };
    out.name = required_string(map, "name", path, errors);
    out.url = opt_string(map, "url", path, errors);
    out.icon = opt_string(map, "icon", path, errors);
    out.subtitle = opt_string(map, "subtitle", path, errors);
    out.ping = opt_string(map, "ping", path, errors);
    out.ping_method = opt_enum(
        map,
        "pingMethod",
        path,
        errors,
        PingMethod::parse,
        PingMethod::ACCEPTED,
    );
    out.align = opt_enum(map, "align", path, errors, Align::parse, Align::ACCEPTED);
    out.layout = opt_enum(map, "layout", path, errors, Layout::parse, Layout::ACCEPTED);
    out.background_color = opt_string(map, "backgroundColor", path, errors);
    out.text_color = opt_string(map, "textColor", path, errors);
    out.hidden = opt_bool(map, "hidden", path, errors);
    out.local = opt_bool(map, "local", path, errors);
    out
}

fn settings(v: &Value, path: &str, errors: &mut Vec<FieldError>) -> Settings {
    let mut out = Settings::default();
    let Some(map) = as_mapping(v, path, errors) else {
        return out;
    };
    out.show_title_backgrounds = opt_bool(map, "showTitleBackgrounds", path, errors);
    out.background_blur = opt_uint(map, "backgroundBlur", path, errors);
    out.local_ip = opt_string(map, "localIp", path, errors);
    out
}

// ── Coercion helpers ─────────────────────────────────────────────────

fn push(errors: &mut Vec<FieldError>, path: &str, message: impl Into<String>) {
    errors.push(FieldError {
        path: path.to_string(),
        message: message.into(),
    });
}

fn join(path: &str, key: &str) -> String {
    format!("{path}.{key}")
}

/// Look up a key, treating an explicit YAML null the same as absence.
fn field<'a>(map: &'a Mapping, key: &str) -> Option<&'a Value> {
    match map.get(Value::String(key.to_string())) {
        Some(Value::Null) | None => None,
        Some(v) => Some(v),
    }
}

fn as_mapping<'a>(v: &'a Value, path: &str, errors: &mut Vec<FieldError>) -> Option<&'a Mapping> {
    match v {
        Value::Mapping(m) => Some(m),
        _ => {
            push(errors, path, "expected a mapping");
            None
        }
    }
}

fn as_string(v: &Value, path: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        _ => {
            push(errors, path, "expected a string");
            None
        }
    }
}

fn as_columns(v: &Value, path: &str, errors: &mut Vec<FieldError>) -> Option<u8> {
    match v.as_i64() {
        Some(n) if (1..=6).contains(&n) => Some(n as u8),
        Some(_) => {
            push(errors, path, "must be between 1 and 6");
            None
        }
        None => {
            push(errors, path, "expected an integer");
            None
        }
    }
}

fn list<T>(
    v: &Value,
    path: &str,
    errors: &mut Vec<FieldError>,
    item: fn(&Value, &str, &mut Vec<FieldError>) -> T,
) -> Vec<T> {
    match v {
        Value::Sequence(seq) => seq
            .iter()
            .enumerate()
            .map(|(i, v)| item(v, &format!("{path}[{i}]"), errors))
            .collect(),
        _ => {
            push(errors, path, "expected a list");
            Vec::new()
        }
    }
}

fn required_string(map: &Mapping, key: &str, path: &str, errors: &mut Vec<FieldError>) -> String {
    let full = join(path, key);
    match field(map, key) {
        Some(v) => as_string(v, &full, errors).unwrap_or_default(),
        None => {
            push(errors, &full, "missing required field");
            String::new()
        }
    }
}

fn set_string(
    map: &Mapping,
    key: &str,
    path: &str,
    errors: &mut Vec<FieldError>,
    set: impl FnOnce(String),
) {
    if let Some(v) = field(map, key) {
        if let Some(s) = as_string(v, &join(path, key), errors) {
            set(s);
        }
    }
}

fn opt_string(map: &Mapping, key: &str, path: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    field(map, key).and_then(|v| as_string(v, &join(path, key), errors))
}

fn opt_bool(map: &Mapping, key: &str, path: &str, errors: &mut Vec<FieldError>) -> Option<bool> {
    let v = field(map, key)?;
    match v.as_bool() {
        Some(b) => Some(b),
        None => {
            push(errors, &join(path, key), "expected a boolean");
            None
        }
    }
}

fn opt_uint(map: &Mapping, key: &str, path: &str, errors: &mut Vec<FieldError>) -> Option<u32> {
    let v = field(map, key)?;
    match v.as_u64() {
        Some(n) if n <= u32::MAX as u64 => Some(n as u32),
        _ => {
            push(errors, &join(path, key), "expected a non-negative integer");
            None
        }
    }
}

fn opt_enum<T>(
    map: &Mapping,
    key: &str,
    path: &str,
    errors: &mut Vec<FieldError>,
    parse: fn(&str) -> Option<T>,
    accepted: &[&str],
) -> Option<T> {
    let v = field(map, key)?;
    let full = join(path, key);
    let s = as_string(v, &full, errors)?;
    match parse(&s) {
        Some(t) => Some(t),
        None => {
            push(errors, &full, format!("expected one of {}", accepted.join(", ")));
            None
        }
    }
}

fn req_enum<T>(
    map: &Mapping,
    key: &str,
    path: &str,
    errors: &mut Vec<FieldError>,
    parse: fn(&str) -> Option<T>,
    accepted: &[&str],
) -> Option<T> {
    let full = join(path, key);
    if field(map, key).is_none() {
        push(errors, &full, "missing required field");
        return None;
    }
    opt_enum(map, key, path, errors, parse, accepted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn empty_document_is_fully_defaulted() {
        let doc = validate(&Value::Null).unwrap();
        assert_eq!(doc.title, "My Dashboard");
        assert_eq!(doc.default_columns, 4);
        assert_eq!(doc.theme.main_background, "#111827");
        assert!(doc.groups.is_empty());
        assert!(doc.services.is_none());
    }

    #[test]
    fn known_fields_coerced_and_missing_theme_defaulted() {
        let doc = validate(&parse(
            r#"
groups:
  - name: Media
    columns: 3
    services:
      - name: Test
        url: http://x
"#,
        ))
        .unwrap();
        assert_eq!(doc.groups[0].name, "Media");
        assert_eq!(doc.groups[0].columns, Some(3));
        assert_eq!(doc.groups[0].services[0].name, "Test");
        assert_eq!(doc.groups[0].services[0].url.as_deref(), Some("http://x"));
        // theme omitted from the input but present in the output
        assert_eq!(doc.theme.text, "#ffffff");
    }

    #[test]
    fn wrong_type_reports_field_path() {
        let err = validate(&parse("defaultColumns: \"four\"")).unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.errors[0].path, "defaultColumns");
        assert_eq!(err.errors[0].message, "expected an integer");
    }

    #[test]
    fn nested_errors_carry_indexed_paths() {
        let err = validate(&parse(
            r#"
groups:
  - name: Media
    columns: nine
    services:
      - url: http://x
"#,
        ))
        .unwrap_err();
        let paths: Vec<&str> = err.errors.iter().map(|e| e.path.as_str()).collect();
        assert!(paths.contains(&"groups[0].columns"));
        assert!(paths.contains(&"groups[0].services[0].name"));
    }

    #[test]
    fn columns_out_of_range_is_an_error_not_a_clamp() {
        let err = validate(&parse("defaultColumns: 9")).unwrap_err();
        assert_eq!(err.errors[0].message, "must be between 1 and 6");
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let doc = validate(&parse(
            r##"
title: Home
futureFeature: true
theme:
  mainBackground: "#000000"
  somethingNew: 12
"##,
        ))
        .unwrap();
        assert_eq!(doc.title, "Home");
        assert_eq!(doc.theme.main_background, "#000000");
    }

    #[test]
    fn unrecognized_enum_value_lists_accepted_set() {
        let err = validate(&parse(
            r#"
services:
  - name: A
    layout: diagonal
"#,
        ))
        .unwrap_err();
        assert_eq!(err.errors[0].path, "services[0].layout");
        assert_eq!(
            err.errors[0].message,
            "expected one of vertical, horizontal, horizontal-reverse"
        );
    }

    #[test]
    fn widget_type_is_required_and_discriminated() {
        let err = validate(&parse(
            r#"
widgets:
  columns: 2
  items:
    - name: Clock
"#,
        ))
        .unwrap_err();
        assert_eq!(err.errors[0].path, "widgets.items[0].type");

        let doc = validate(&parse(
            r#"
widgets:
  columns: 2
  items:
    - name: Clock
      type: clock
      format: 24h
    - name: Weather
      type: weather
      provider: weatherapi
      city: Oslo
"#,
        ))
        .unwrap();
        let items = &doc.widgets.unwrap().items;
        assert_eq!(items[0].widget_type, WidgetType::Clock);
        assert_eq!(items[1].provider, Some(WeatherProvider::WeatherApi));
    }

    #[test]
    fn explicit_null_is_treated_as_absent() {
        let doc = validate(&parse("title:\ngroups:\n")).unwrap();
        assert_eq!(doc.title, "My Dashboard");
        assert!(doc.groups.is_empty());
    }

    #[test]
    fn background_bookkeeping_fields() {
        let doc = validate(&parse(
            r#"
backgrounds:
  active: sunset.jpg
  history: [sunset.jpg, city.png]
  modifier: blur
  blurAmount: 8
"#,
        ))
        .unwrap();
        let b = doc.backgrounds.unwrap();
        assert_eq!(b.active.as_deref(), Some("sunset.jpg"));
        assert_eq!(b.history, vec!["sunset.jpg", "city.png"]);
        assert_eq!(b.modifier, Some(BackgroundModifier::Blur));
        assert_eq!(b.blur_amount, Some(8));
    }

    #[test]
    fn normalization_is_idempotent() {
        let first = validate(&parse(
            r#"
title: Lab
groups:
  - name: Media
    services:
      - name: Plex
        icon: plex
        ping: http://plex:32400
        pingMethod: GET
services:
  - name: Router
    local: true
settings:
  showTitleBackgrounds: true
"#,
        ))
        .unwrap();
        let reserialized = serde_yaml::to_string(&first).unwrap();
        let second = validate(&serde_yaml::from_str(&reserialized).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn non_mapping_root_is_rejected() {
        let err = validate(&parse("- just\n- a\n- list")).unwrap_err();
        assert_eq!(err.errors[0].path, "$");
    }
}
