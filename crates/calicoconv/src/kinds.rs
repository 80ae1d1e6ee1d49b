use calicoconv_core::ResourceKind;
use colored::Colorize;
use serde::Serialize;

use crate::prelude::{println, *};

#[derive(Debug, clap::Parser)]
#[command(name = "kinds")]
#[command(about = "List the v1 kinds that can be converted")]
pub struct App {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct KindOutput {
    pub v1_kind: &'static str,
    pub v3_kind: &'static str,
}

pub fn supported_kinds() -> Vec<KindOutput> {
    ResourceKind::ALL
        .iter()
        .map(|kind| KindOutput {
            v1_kind: kind.v1_name(),
            v3_kind: kind.v3_kind(),
        })
        .collect()
}

pub fn run(app: App, _global: crate::Global) -> Result<()> {
    let kinds = supported_kinds();

    if app.json {
        println!("{}", serde_json::to_string_pretty(&kinds)?);
        return Ok(());
    }

    let mut table = new_table();
    table.add_row(prettytable::row![
        "v1 kind".bold().to_string(),
        "v3 kind".bold().to_string()
    ]);
    for kind in &kinds {
        table.add_row(prettytable::row![kind.v1_kind, kind.v3_kind.green().to_string()]);
    }
    table.printstd();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_kinds() {
        let kinds = supported_kinds();
        assert_eq!(kinds.len(), 7);
        assert!(kinds.contains(&KindOutput {
            v1_kind: "policy",
            v3_kind: "GlobalNetworkPolicy"
        }));
        assert!(kinds.contains(&KindOutput {
            v1_kind: "ippool",
            v3_kind: "IPPool"
        }));
        for kind in &kinds {
            assert_eq!(
                ResourceKind::parse(kind.v1_kind).map(ResourceKind::v3_kind),
                Some(kind.v3_kind)
            );
        }
    }
}
