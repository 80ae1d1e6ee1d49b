//! YAML and JSON renderings of the converted resources

use std::io::Write;

use calicoconv_core::api::v3::{V3Resource, API_VERSION};
use calicoconv_core::{Printer, PrinterError};
use serde::Serialize;

/// Kind of the wrapper printed around anything but a single resource.
const LIST_KIND: &str = "List";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// YAML documents
    Yaml,
    /// Alias for yaml
    Yml,
    /// Pretty-printed JSON
    Json,
}

/// What actually gets serialized: one resource alone, or a `List`.
#[derive(Serialize)]
#[serde(untagged)]
enum Output<'a> {
    Single(&'a V3Resource),
    List(ResourceList<'a>),
}

#[derive(Serialize)]
struct ResourceList<'a> {
    #[serde(rename = "apiVersion")]
    api_version: &'static str,
    kind: &'static str,
    items: &'a [V3Resource],
}

impl<'a> Output<'a> {
    fn new(resources: &'a [V3Resource]) -> Self {
        match resources {
            [single] => Output::Single(single),
            items => Output::List(ResourceList {
                api_version: API_VERSION,
                kind: LIST_KIND,
                items,
            }),
        }
    }
}

pub struct YamlPrinter<W> {
    writer: W,
}

impl<W: Write> YamlPrinter<W> {
    pub fn new(writer: W) -> Self {
        YamlPrinter { writer }
    }
}

impl<W: Write> Printer for YamlPrinter<W> {
    fn print(&mut self, resources: &[V3Resource]) -> Result<(), PrinterError> {
        log_resources(resources);
        serde_yaml::to_writer(&mut self.writer, &Output::new(resources))
            .map_err(PrinterError::new)?;
        self.writer.flush().map_err(PrinterError::new)
    }
}

pub struct JsonPrinter<W> {
    writer: W,
}

impl<W: Write> JsonPrinter<W> {
    pub fn new(writer: W) -> Self {
        JsonPrinter { writer }
    }
}

impl<W: Write> Printer for JsonPrinter<W> {
    fn print(&mut self, resources: &[V3Resource]) -> Result<(), PrinterError> {
        log_resources(resources);
        serde_json::to_writer_pretty(&mut self.writer, &Output::new(resources))
            .map_err(PrinterError::new)?;
        writeln!(self.writer).map_err(PrinterError::new)?;
        self.writer.flush().map_err(PrinterError::new)
    }
}

/// Build the printer for `format` on top of `writer`.
pub fn for_format<'w, W: Write + 'w>(format: OutputFormat, writer: W) -> Box<dyn Printer + 'w> {
    match format {
        OutputFormat::Yaml | OutputFormat::Yml => Box::new(YamlPrinter::new(writer)),
        OutputFormat::Json => Box::new(JsonPrinter::new(writer)),
    }
}

fn log_resources(resources: &[V3Resource]) {
    for resource in resources {
        log::info!(
            "Converted to {} '{}'",
            resource.kind(),
            resource.metadata().name
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calicoconv_core::api::v3::{self, ObjectMeta};

    fn profile(name: &str) -> V3Resource {
        V3Resource::Profile(v3::Profile::new(
            v3::KIND_PROFILE,
            ObjectMeta::named(name),
            v3::ProfileSpec::default(),
        ))
    }

    fn print_to_string(format: OutputFormat, resources: &[V3Resource]) -> String {
        let mut buffer = Vec::new();
        for_format(format, &mut buffer).print(resources).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_single_resource_prints_alone() {
        let output = print_to_string(OutputFormat::Yaml, &[profile("web")]);
        let value: serde_json::Value = serde_yaml::from_str(&output).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "apiVersion": "projectcalico.org/v3",
                "kind": "Profile",
                "metadata": {"name": "web"},
                "spec": {}
            })
        );
    }

    #[test]
    fn test_many_resources_print_as_list() {
        let output = print_to_string(OutputFormat::Json, &[profile("a"), profile("b")]);
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["apiVersion"], "projectcalico.org/v3");
        assert_eq!(value["kind"], "List");
        assert_eq!(value["items"][0]["metadata"]["name"], "a");
        assert_eq!(value["items"][1]["metadata"]["name"], "b");
        assert!(output.ends_with("}\n"));
    }

    #[test]
    fn test_empty_batch_prints_empty_list() {
        let output = print_to_string(OutputFormat::Yml, &[]);
        let value: serde_json::Value = serde_yaml::from_str(&output).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"apiVersion": "projectcalico.org/v3", "kind": "List", "items": []})
        );
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_is_a_printer_error() {
        let err = JsonPrinter::new(BrokenPipe)
            .print(&[profile("web")])
            .unwrap_err();
        assert!(err.to_string().starts_with("failed to print resources"));
    }
}
