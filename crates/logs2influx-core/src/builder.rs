//! Log event to point conversion.
//!
//! The builder is an ordered list of attach steps. Each step pairs a
//! predicate with a key and a value producer; steps run in a fixed order
//! over an accumulating [`Point`]:
//!
//! 1. tags `app`, `facility`, `hostname`, `level`, `severity`
//! 2. field `message`, then the default fields `facility`, `procid`,
//!    `severity`, `timestamp`, `version`
//! 3. timestamp (milliseconds)
//! 4. extended tags, then extended fields
//! 5. tag `exception_type` and field `exception`

use std::sync::Arc;

use crate::escape::escape;
use crate::event::{LogEvent, PropertyValue};
use crate::extended::ExtendedSpec;
use crate::host::HostInfo;
use crate::point::{FieldValue, Point, WritePrecision};
use crate::severity::{severity, Severity};

pub const DEFAULT_MEASUREMENT_NAME: &str = "syslog";

/// Value written to the `facility` default field.
const SYSLOG_FACILITY: &str = "console";
/// Value written to the `version` default field.
const SYSLOG_VERSION: i64 = 1;

/// Fully resolved builder options.
///
/// Inclusion flags are plain booleans here; fallback to the default-fields
/// flag happens when options are loaded from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct BuilderOptions {
    pub measurement_name: String,
    pub application_name: Option<String>,
    /// Value of the `facility` tag. Callers default this to the application
    /// name; `Some("")` suppresses the tag.
    pub instance_name: Option<String>,
    pub include_hostname: bool,
    pub include_level: bool,
    pub include_severity: bool,
    pub include_default_fields: bool,
    pub include_full_exception: bool,
    pub extended_tags: Vec<ExtendedSpec>,
    pub extended_fields: Vec<ExtendedSpec>,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            measurement_name: DEFAULT_MEASUREMENT_NAME.to_string(),
            application_name: None,
            instance_name: None,
            include_hostname: true,
            include_level: true,
            include_severity: true,
            include_default_fields: true,
            include_full_exception: true,
            extended_tags: Vec::new(),
            extended_fields: Vec::new(),
        }
    }
}

/// Per-event state shared by the attach steps.
struct BuildContext<'a> {
    event: &'a LogEvent,
    options: &'a BuilderOptions,
    host: &'a dyn HostInfo,
    severity: Severity,
}

struct TagStep {
    key: &'static str,
    when: fn(&BuildContext<'_>) -> bool,
    value: fn(&BuildContext<'_>) -> String,
}

struct FieldStep {
    key: &'static str,
    when: fn(&BuildContext<'_>) -> bool,
    value: fn(&BuildContext<'_>) -> FieldValue,
}

const TAG_STEPS: &[TagStep] = &[
    TagStep {
        key: "app",
        when: has_application_name,
        value: application_name,
    },
    TagStep {
        key: "facility",
        when: has_instance_name,
        value: instance_name,
    },
    TagStep {
        key: "hostname",
        when: include_hostname,
        value: machine_name,
    },
    TagStep {
        key: "level",
        when: include_level,
        value: level_name,
    },
    TagStep {
        key: "severity",
        when: include_severity,
        value: severity_name,
    },
];

const FIELD_STEPS: &[FieldStep] = &[
    FieldStep {
        key: "message",
        when: include_message,
        value: escaped_message,
    },
    FieldStep {
        key: "facility",
        when: include_default_fields,
        value: syslog_facility,
    },
    FieldStep {
        key: "procid",
        when: include_default_fields,
        value: process_id,
    },
    FieldStep {
        key: "severity",
        when: include_default_fields,
        value: severity_field,
    },
    FieldStep {
        key: "timestamp",
        when: include_default_fields,
        value: timestamp_nanos,
    },
    FieldStep {
        key: "version",
        when: include_default_fields,
        value: syslog_version,
    },
];

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

fn has_application_name(cx: &BuildContext<'_>) -> bool {
    !is_blank(cx.options.application_name.as_deref())
}

fn application_name(cx: &BuildContext<'_>) -> String {
    cx.options.application_name.clone().unwrap_or_default()
}

fn has_instance_name(cx: &BuildContext<'_>) -> bool {
    !is_blank(cx.options.instance_name.as_deref())
}

fn instance_name(cx: &BuildContext<'_>) -> String {
    cx.options.instance_name.clone().unwrap_or_default()
}

fn include_hostname(cx: &BuildContext<'_>) -> bool {
    cx.options.include_hostname
}

fn machine_name(cx: &BuildContext<'_>) -> String {
    cx.host.machine_name().to_string()
}

fn include_level(cx: &BuildContext<'_>) -> bool {
    cx.options.include_level
}

fn level_name(cx: &BuildContext<'_>) -> String {
    cx.event.level.as_str().to_string()
}

fn include_severity(cx: &BuildContext<'_>) -> bool {
    cx.options.include_severity
}

fn severity_name(cx: &BuildContext<'_>) -> String {
    cx.severity.name.to_string()
}

// A blank message is only recorded when default fields force it.
fn include_message(cx: &BuildContext<'_>) -> bool {
    cx.options.include_default_fields || !cx.event.message.trim().is_empty()
}

fn escaped_message(cx: &BuildContext<'_>) -> FieldValue {
    FieldValue::String(escape(&cx.event.message).into_owned())
}

fn include_default_fields(cx: &BuildContext<'_>) -> bool {
    cx.options.include_default_fields
}

fn syslog_facility(_cx: &BuildContext<'_>) -> FieldValue {
    FieldValue::String(SYSLOG_FACILITY.to_string())
}

fn process_id(cx: &BuildContext<'_>) -> FieldValue {
    FieldValue::String(cx.host.process_id().to_string())
}

fn severity_field(cx: &BuildContext<'_>) -> FieldValue {
    FieldValue::String(cx.severity.name.to_string())
}

fn timestamp_nanos(cx: &BuildContext<'_>) -> FieldValue {
    FieldValue::Integer(cx.event.timestamp.timestamp_millis().saturating_mul(1_000_000))
}

fn syslog_version(_cx: &BuildContext<'_>) -> FieldValue {
    FieldValue::Integer(SYSLOG_VERSION)
}

/// Convert a property to a tag value. Null and blank values are skipped.
fn property_tag_value(value: &PropertyValue) -> Option<String> {
    value.render_text().filter(|text| !text.trim().is_empty())
}

/// Convert a property to a typed field value. Null is skipped.
fn property_field_value(value: &PropertyValue) -> Option<FieldValue> {
    match value {
        PropertyValue::Null => None,
        PropertyValue::Bool(b) => Some(FieldValue::Boolean(*b)),
        PropertyValue::Integer(i) => Some(FieldValue::Integer(*i)),
        PropertyValue::Float(f) => Some(FieldValue::Float(*f)),
        PropertyValue::String(s) => Some(FieldValue::String(escape(s).into_owned())),
        PropertyValue::Sequence(_) | PropertyValue::Map(_) => value
            .render_text()
            .map(|text| FieldValue::String(escape(&text).into_owned())),
    }
}

/// Builds one [`Point`] per [`LogEvent`].
#[derive(Clone)]
pub struct PointBuilder {
    options: BuilderOptions,
    host: Arc<dyn HostInfo>,
}

impl PointBuilder {
    pub fn new(options: BuilderOptions, host: Arc<dyn HostInfo>) -> Self {
        Self { options, host }
    }

    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    /// Build the point for one event.
    ///
    /// With default fields enabled the point always carries at least one
    /// field. Without them, a blank message and no matching extended field
    /// yield a point with zero fields.
    pub fn build(&self, event: &LogEvent) -> Point {
        let cx = BuildContext {
            event,
            options: &self.options,
            host: self.host.as_ref(),
            severity: severity(event.level),
        };

        let measurement = if self.options.measurement_name.trim().is_empty() {
            DEFAULT_MEASUREMENT_NAME
        } else {
            self.options.measurement_name.as_str()
        };
        let mut point = Point::new(measurement);

        for step in TAG_STEPS {
            if (step.when)(&cx) {
                point.set_tag(step.key, (step.value)(&cx));
            }
        }

        for step in FIELD_STEPS {
            if (step.when)(&cx) {
                point.set_field(step.key, (step.value)(&cx));
            }
        }

        point.set_timestamp(event.timestamp.timestamp_millis(), WritePrecision::Ms);

        for spec in &self.options.extended_tags {
            if let Some(value) = event.property(spec.property()).and_then(property_tag_value) {
                point.set_tag(spec.output(), value);
            }
        }

        for spec in &self.options.extended_fields {
            if let Some(value) = event.property(spec.property()).and_then(property_field_value) {
                point.set_field(spec.output(), value);
            }
        }

        if let Some(exception) = &event.exception {
            // An empty tag value would fail the whole write.
            if !exception.type_name.trim().is_empty() {
                point.set_tag("exception_type", exception.type_name.as_str());
            }
            if self.options.include_full_exception {
                point.set_field(
                    "exception",
                    FieldValue::String(escape(&exception.full_text).into_owned()),
                );
            }
        }

        point
    }

    /// Build points for a batch, preserving input order.
    pub fn build_all(&self, events: &[LogEvent]) -> Vec<Point> {
        events.iter().map(|event| self.build(event)).collect()
    }
}

impl std::fmt::Debug for PointBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointBuilder")
            .field("options", &self.options)
            .field("machine_name", &self.host.machine_name())
            .field("process_id", &self.host.process_id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Level;
    use crate::host::HostSnapshot;
    use chrono::DateTime;

    fn builder(options: BuilderOptions) -> PointBuilder {
        PointBuilder::new(options, Arc::new(HostSnapshot::new("web-01", 4242)))
    }

    fn app_options() -> BuilderOptions {
        BuilderOptions {
            application_name: Some("App".to_string()),
            instance_name: Some("App".to_string()),
            ..BuilderOptions::default()
        }
    }

    fn event(level: Level, message: &str) -> LogEvent {
        let ts = DateTime::parse_from_rfc3339("2024-01-15T14:30:00.250Z").unwrap();
        LogEvent::new(ts, level, message)
    }

    fn field_keys(point: &Point) -> Vec<&str> {
        point.fields().iter().map(|(k, _)| k.as_str()).collect()
    }

    fn tag_keys(point: &Point) -> Vec<&str> {
        point.tags().iter().map(|(k, _)| k.as_str()).collect()
    }

    #[test]
    fn test_default_options_full_point() {
        let point = builder(app_options()).build(&event(Level::Warning, "Disk \"C\" low"));

        assert_eq!(point.measurement(), "syslog");
        assert_eq!(
            tag_keys(&point),
            vec!["app", "facility", "hostname", "level", "severity"]
        );
        assert_eq!(point.tag("app"), Some("App"));
        assert_eq!(point.tag("facility"), Some("App"));
        assert_eq!(point.tag("hostname"), Some("web-01"));
        assert_eq!(point.tag("level"), Some("Warning"));
        assert_eq!(point.tag("severity"), Some("warning"));

        assert_eq!(
            field_keys(&point),
            vec!["message", "facility", "procid", "severity", "timestamp", "version"]
        );
        assert_eq!(
            point.field("message"),
            Some(&FieldValue::String("Disk \\\"C\\\" low".to_string()))
        );
        assert_eq!(point.field("facility"), Some(&FieldValue::from("console")));
        assert_eq!(point.field("procid"), Some(&FieldValue::from("4242")));
        assert_eq!(point.field("severity"), Some(&FieldValue::from("warning")));
        assert_eq!(
            point.field("timestamp"),
            Some(&FieldValue::Integer(1_705_329_000_250_000_000))
        );
        assert_eq!(point.field("version"), Some(&FieldValue::Integer(1)));

        assert_eq!(point.timestamp(), Some(1_705_329_000_250));
        assert_eq!(point.precision(), WritePrecision::Ms);
    }

    #[test]
    fn test_app_and_facility_tags() {
        let point = builder(app_options()).build(&event(Level::Information, "hi"));
        assert_eq!(point.tag("app"), Some("App"));
        assert_eq!(point.tag("facility"), Some("App"));
    }

    #[test]
    fn test_unset_instance_name_writes_no_facility_tag() {
        let options = BuilderOptions {
            application_name: Some("App".to_string()),
            ..BuilderOptions::default()
        };
        let point = builder(options).build(&event(Level::Information, "hi"));
        assert_eq!(point.tag("app"), Some("App"));
        assert_eq!(point.tag("facility"), None);
    }

    #[test]
    fn test_empty_instance_name_suppresses_facility_tag() {
        let options = BuilderOptions {
            instance_name: Some(String::new()),
            ..app_options()
        };
        let point = builder(options).build(&event(Level::Information, "hi"));
        assert_eq!(point.tag("app"), Some("App"));
        assert_eq!(point.tag("facility"), None);
    }

    #[test]
    fn test_blank_application_name_skipped() {
        let options = BuilderOptions {
            application_name: Some("  ".to_string()),
            ..BuilderOptions::default()
        };
        let point = builder(options).build(&event(Level::Information, "hi"));
        assert_eq!(point.tag("app"), None);
        assert_eq!(point.tag("facility"), None);
    }

    #[test]
    fn test_inclusion_flags_disable_tags() {
        let options = BuilderOptions {
            include_hostname: false,
            include_level: false,
            include_severity: false,
            ..app_options()
        };
        let point = builder(options).build(&event(Level::Error, "boom"));
        assert_eq!(tag_keys(&point), vec!["app", "facility"]);
    }

    #[test]
    fn test_blank_message_kept_when_default_fields_enabled() {
        let point = builder(app_options()).build(&event(Level::Debug, "  "));
        assert_eq!(point.field("message"), Some(&FieldValue::from("  ")));
    }

    #[test]
    fn test_no_default_fields_blank_message_yields_zero_fields() {
        let options = BuilderOptions {
            include_default_fields: false,
            ..app_options()
        };
        let point = builder(options).build(&event(Level::Information, ""));
        assert!(point.fields().is_empty());
        assert!(!point.has_fields());
    }

    #[test]
    fn test_no_default_fields_keeps_non_blank_message_only() {
        let options = BuilderOptions {
            include_default_fields: false,
            ..app_options()
        };
        let point = builder(options).build(&event(Level::Information, "only me"));
        assert_eq!(field_keys(&point), vec!["message"]);
    }

    #[test]
    fn test_extended_field_is_only_field() {
        let options = BuilderOptions {
            include_default_fields: false,
            extended_fields: vec![ExtendedSpec::parse("MyField").unwrap()],
            ..app_options()
        };
        let ev = event(Level::Information, "").with_property("MyField", "value");
        let point = builder(options).build(&ev);

        assert_eq!(point.fields().len(), 1);
        assert_eq!(point.field("MyField"), Some(&FieldValue::from("value")));
        assert_eq!(point.field("message"), None);
    }

    #[test]
    fn test_extended_tag_rename() {
        let options = BuilderOptions {
            extended_tags: vec![ExtendedSpec::parse("SourceContext:context").unwrap()],
            ..app_options()
        };
        let ev = event(Level::Information, "hi").with_property("SourceContext", "Foo");
        let point = builder(options).build(&ev);

        assert_eq!(point.tag("context"), Some("Foo"));
        assert_eq!(point.tag("SourceContext"), None);
    }

    #[test]
    fn test_absent_and_null_properties_skipped() {
        let options = BuilderOptions {
            extended_tags: vec![
                ExtendedSpec::parse("Missing").unwrap(),
                ExtendedSpec::parse("Nothing").unwrap(),
            ],
            extended_fields: vec![
                ExtendedSpec::parse("Missing").unwrap(),
                ExtendedSpec::parse("Nothing").unwrap(),
            ],
            ..app_options()
        };
        let ev = event(Level::Information, "hi").with_property("Nothing", PropertyValue::Null);
        let point = builder(options).build(&ev);

        assert_eq!(point.tag("Missing"), None);
        assert_eq!(point.tag("Nothing"), None);
        assert_eq!(point.field("Missing"), None);
        assert_eq!(point.field("Nothing"), None);
    }

    #[test]
    fn test_extended_fields_keep_types() {
        let options = BuilderOptions {
            extended_fields: vec![
                ExtendedSpec::parse("Elapsed:elapsed_ms").unwrap(),
                ExtendedSpec::parse("Ratio").unwrap(),
                ExtendedSpec::parse("Cached").unwrap(),
                ExtendedSpec::parse("Path").unwrap(),
                ExtendedSpec::parse("Roles").unwrap(),
            ],
            ..app_options()
        };
        let ev = event(Level::Information, "req")
            .with_property("Elapsed", 125i64)
            .with_property("Ratio", 0.5)
            .with_property("Cached", true)
            .with_property("Path", "C:\\logs\\app.log")
            .with_property(
                "Roles",
                PropertyValue::Sequence(vec!["admin".into(), "ops".into()]),
            );
        let point = builder(options).build(&ev);

        assert_eq!(point.field("elapsed_ms"), Some(&FieldValue::Integer(125)));
        assert_eq!(point.field("Ratio"), Some(&FieldValue::Float(0.5)));
        assert_eq!(point.field("Cached"), Some(&FieldValue::Boolean(true)));
        assert_eq!(
            point.field("Path"),
            Some(&FieldValue::from("C:\\\\logs\\\\app.log"))
        );
        assert_eq!(
            point.field("Roles"),
            Some(&FieldValue::from("[\\\"admin\\\",\\\"ops\\\"]"))
        );
    }

    #[test]
    fn test_exception_type_tag_without_full_exception() {
        let options = BuilderOptions {
            include_full_exception: false,
            ..app_options()
        };
        let ev = event(Level::Error, "failed")
            .with_exception("ArgumentException", "ArgumentException: bad\n   at X.Y()");
        let point = builder(options).build(&ev);

        assert_eq!(point.tag("exception_type"), Some("ArgumentException"));
        assert_eq!(point.field("exception"), None);
    }

    #[test]
    fn test_full_exception_field_is_escaped() {
        let ev = event(Level::Fatal, "crash")
            .with_exception("IOException", "IOException: \"disk\"\n   at X.Y()");
        let point = builder(app_options()).build(&ev);

        assert_eq!(point.tag("exception_type"), Some("IOException"));
        assert_eq!(
            point.field("exception"),
            Some(&FieldValue::from("IOException: \\\"disk\\\"\\n   at X.Y()"))
        );
        assert_eq!(point.tag("severity"), Some("emerg"));
    }

    #[test]
    fn test_hostile_tag_values_encode_on_one_line() {
        let options = BuilderOptions {
            include_default_fields: false,
            include_hostname: false,
            extended_tags: vec![
                ExtendedSpec::parse("Ctx").unwrap(),
                ExtendedSpec::parse("Dir").unwrap(),
            ],
            ..app_options()
        };
        let ev = event(Level::Information, "hi")
            .with_property("Ctx", "line1\nline2")
            .with_property("Dir", "C:\\")
            .with_exception("Bad\nType", "trace");
        let line = builder(options).build(&ev).to_line_protocol();

        assert!(!line.contains('\n'));
        assert_eq!(
            line,
            "syslog,app=App,facility=App,level=Information,severity=info,Ctx=line1\\nline2,Dir=C:\\\\,exception_type=Bad\\nType message=\"hi\",exception=\"trace\" 1705329000250"
        );
    }

    #[test]
    fn test_blank_exception_type_skipped() {
        let ev = event(Level::Error, "failed").with_exception("  ", "trace");
        let point = builder(app_options()).build(&ev);
        assert_eq!(point.tag("exception_type"), None);
        assert!(point.field("exception").is_some());
    }

    #[test]
    fn test_custom_measurement_and_line_protocol() {
        let options = BuilderOptions {
            measurement_name: "app_logs".to_string(),
            include_default_fields: false,
            include_hostname: false,
            ..app_options()
        };
        let point = builder(options).build(&event(Level::Information, "ready"));

        assert_eq!(
            point.to_line_protocol(),
            "app_logs,app=App,facility=App,level=Information,severity=info message=\"ready\" 1705329000250"
        );
    }

    #[test]
    fn test_build_all_preserves_order() {
        let events = vec![
            event(Level::Information, "first"),
            event(Level::Warning, "second"),
            event(Level::Error, "third"),
        ];
        let points = builder(app_options()).build_all(&events);
        let messages: Vec<_> = points
            .iter()
            .map(|p| p.field("message").and_then(FieldValue::as_str).unwrap())
            .collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
    }
}
