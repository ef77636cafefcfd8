use anyhow::{Context as _, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tera::{Context, Tera};

use crate::models::{DeviceBgpFindings, FleetReport, MlagFindings, TopologyLink};

const REPORT_TEMPLATE: &str = include_str!("templates/report.html");
const GRAPHML_TEMPLATE: &str = include_str!("templates/topology.graphml");

#[derive(Serialize)]
struct VrfSection {
    name: String,
    lines: Vec<(String, String)>,
}

#[derive(Serialize)]
struct BgpSection {
    title: String,
    message: Option<String>,
    vrfs: Vec<VrfSection>,
}

#[derive(Serialize)]
struct MlagSection {
    title: String,
    message: Option<String>,
    lines: Vec<(String, String)>,
}

#[derive(Serialize)]
struct ErrorSection {
    title: &'static str,
    entries: Vec<(String, String)>,
}

#[derive(Serialize)]
struct GraphEdge<'a> {
    id: String,
    local_device: &'a str,
    remote_device: &'a str,
    local_port: &'a str,
    remote_port: &'a str,
    speed_gbps: Option<f64>,
}

fn templates() -> Result<Tera> {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![".html", ".graphml"]);
    tera.add_raw_template("report.html", REPORT_TEMPLATE)
        .map_err(|e| anyhow::anyhow!("Invalid report template: {}", e))?;
    tera.add_raw_template("topology.graphml", GRAPHML_TEMPLATE)
        .map_err(|e| anyhow::anyhow!("Invalid topology template: {}", e))?;
    Ok(tera)
}

/// "address (hostname)" when the hostname is known
fn device_titles(report: &FleetReport) -> BTreeMap<&str, String> {
    report
        .devices
        .iter()
        .map(|d| {
            let title = match &d.hostname {
                Some(h) if h != &d.address => format!("{} ({})", d.address, h),
                _ => d.address.clone(),
            };
            (d.address.as_str(), title)
        })
        .collect()
}

fn title_for(titles: &BTreeMap<&str, String>, address: &str) -> String {
    titles
        .get(address)
        .cloned()
        .unwrap_or_else(|| address.to_string())
}

fn bgp_sections(report: &FleetReport, titles: &BTreeMap<&str, String>) -> Vec<BgpSection> {
    report
        .bgp
        .findings
        .iter()
        .map(|(address, findings)| match findings {
            DeviceBgpFindings::NotConfigured => BgpSection {
                title: title_for(titles, address),
                message: Some(DeviceBgpFindings::NOT_CONFIGURED.to_string()),
                vrfs: Vec::new(),
            },
            DeviceBgpFindings::Vrfs(vrfs) => BgpSection {
                title: title_for(titles, address),
                message: None,
                vrfs: vrfs
                    .iter()
                    .map(|(name, finding)| VrfSection {
                        name: name.clone(),
                        lines: finding.lines(),
                    })
                    .collect(),
            },
        })
        .collect()
}

fn mlag_sections(report: &FleetReport, titles: &BTreeMap<&str, String>) -> Vec<MlagSection> {
    report
        .mlag
        .findings
        .iter()
        .map(|(address, findings)| match findings {
            MlagFindings::NotConfigured => MlagSection {
                title: title_for(titles, address),
                message: Some(MlagFindings::NOT_CONFIGURED.to_string()),
                lines: Vec::new(),
            },
            assessed => MlagSection {
                title: title_for(titles, address),
                message: None,
                lines: assessed.lines(),
            },
        })
        .collect()
}

fn error_sections(report: &FleetReport) -> Vec<ErrorSection> {
    let entries = |errors: &BTreeMap<String, String>| -> Vec<(String, String)> {
        errors.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    };
    let topology_errors = report
        .topology
        .as_ref()
        .map(|t| entries(&t.errors))
        .unwrap_or_default();

    [
        ("eAPI or Switch Connectivity Issues", entries(&report.reachability_errors)),
        ("Network Topology Related EOS Commands Error", topology_errors),
        ("BGP Assessment Related EOS Commands Error", entries(&report.bgp.errors)),
        ("MLAG Assessment Related EOS Commands Error", entries(&report.mlag.errors)),
    ]
    .into_iter()
    .filter(|(_, entries)| !entries.is_empty())
    .map(|(title, entries)| ErrorSection { title, entries })
    .collect()
}

/// Render the fleet report as a standalone HTML page
pub fn render_html(report: &FleetReport) -> Result<String> {
    let tera = templates()?;
    let titles = device_titles(report);

    let mut context = Context::new();
    context.insert("started_at", &report.started_at.to_rfc3339());
    context.insert("completed_at", &report.completed_at.to_rfc3339());
    context.insert("summary", &report.summary());
    context.insert("bgp", &bgp_sections(report, &titles));
    context.insert("mlag", &mlag_sections(report, &titles));
    context.insert("error_sections", &error_sections(report));

    tera.render("report.html", &context)
        .map_err(|e| anyhow::anyhow!("Failed to render report: {}", e))
}

/// Render topology links as an undirected GraphML document
pub fn render_graphml(links: &[TopologyLink]) -> Result<String> {
    let tera = templates()?;

    let nodes: BTreeSet<&str> = links
        .iter()
        .flat_map(|l| [l.local_device.as_str(), l.remote_device.as_str()])
        .collect();
    let edges: Vec<GraphEdge> = links
        .iter()
        .enumerate()
        .map(|(i, link)| GraphEdge {
            id: format!("e{}", i),
            local_device: &link.local_device,
            remote_device: &link.remote_device,
            local_port: &link.local_port,
            remote_port: &link.remote_port,
            speed_gbps: link.speed_gbps,
        })
        .collect();

    let mut context = Context::new();
    context.insert("nodes", &nodes);
    context.insert("links", &edges);

    tera.render("topology.graphml", &context)
        .map_err(|e| anyhow::anyhow!("Failed to render topology: {}", e))
}

/// Write the HTML report and, when topology was collected, the GraphML file
pub async fn write_outputs(report: &FleetReport, report_path: &str, topology_path: &str) -> Result<()> {
    let html = render_html(report)?;
    write_file(report_path, &html).await?;
    tracing::info!("Wrote report to {}", report_path);

    if let Some(topology) = &report.topology {
        let graphml = render_graphml(&topology.links)?;
        write_file(topology_path, &graphml).await?;
        tracing::info!("Wrote {} topology links to {}", topology.links.len(), topology_path);
    }
    Ok(())
}

async fn write_file(path: &str, content: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write {}", path))
}
