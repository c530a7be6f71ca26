use std::collections::HashMap;
use std::fmt::Write as _;
use std::io;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::cluster::LineId;
use crate::engine::Drain;

/// Short stable identifier of a template: leading 8 hex chars of its SHA-256.
pub fn event_id(template: &str) -> String {
    let digest = Sha256::digest(template.as_bytes());
    hex::encode(&digest[..4])
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateRow {
    #[serde(rename = "EventId")]
    pub event_id: String,
    #[serde(rename = "EventTemplate")]
    pub template: String,
    #[serde(rename = "Occurrences")]
    pub occurrences: usize,
}

/// One mined line. `content` is the raw text when the caller kept it; lines mined
/// before a reload have none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineRow {
    #[serde(rename = "LineId")]
    pub line_id: LineId,
    #[serde(rename = "Content")]
    pub content: Option<String>,
    #[serde(rename = "EventId")]
    pub event_id: String,
    #[serde(rename = "EventTemplate")]
    pub template: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterRow {
    #[serde(rename = "Cluster")]
    pub cluster: usize,
    #[serde(rename = "EventId")]
    pub event_id: String,
    #[serde(rename = "EventTemplate")]
    pub template: String,
    #[serde(rename = "Size")]
    pub size: usize,
    #[serde(rename = "MemberIds")]
    pub member_ids: Vec<LineId>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub templates: Vec<TemplateRow>,
    pub lines: Vec<LineRow>,
    pub clusters: Vec<ClusterRow>,
}

impl Report {
    pub fn from_engine(drain: &Drain) -> Self {
        Self::from_engine_with_content(drain, &HashMap::new())
    }

    /// Like `from_engine`, filling `LineRow::content` from `contents` by line id.
    pub fn from_engine_with_content(drain: &Drain, contents: &HashMap<LineId, String>) -> Self {
        let mut templates: Vec<TemplateRow> = Vec::new();
        let mut by_template: HashMap<String, usize> = HashMap::new();
        let mut clusters = Vec::with_capacity(drain.len());
        let mut lines = Vec::new();

        for (idx, cluster) in drain.clusters().iter().enumerate() {
            let template = cluster.template_string();
            let eid = event_id(&template);
            // Clusters that ended up with the same template are reported as one event.
            match by_template.get(&template) {
                Some(&row) => templates[row].occurrences += cluster.size(),
                None => {
                    by_template.insert(template.clone(), templates.len());
                    templates.push(TemplateRow {
                        event_id: eid.clone(),
                        template: template.clone(),
                        occurrences: cluster.size(),
                    });
                }
            }
            for &line_id in cluster.member_ids() {
                lines.push(LineRow {
                    line_id,
                    content: contents.get(&line_id).cloned(),
                    event_id: eid.clone(),
                    template: template.clone(),
                });
            }
            clusters.push(ClusterRow {
                cluster: idx,
                event_id: eid,
                template,
                size: cluster.size(),
                member_ids: cluster.member_ids().to_vec(),
            });
        }
        lines.sort_by_key(|r| r.line_id);
        Self { templates, lines, clusters }
    }

    pub fn templates_table(&self) -> String {
        let mut out = format!("{:<10} {:<8} {}\n", "EventId", "Count", "Template");
        for t in &self.templates {
            let _ = writeln!(out, "{:<10} {:<8} {}", t.event_id, t.occurrences, t.template);
        }
        out
    }

    pub fn lines_table(&self) -> String {
        let mut out = format!("{:<8} {:<10} {}\n", "LineId", "EventId", "Template");
        for l in &self.lines {
            let _ = writeln!(out, "{:<8} {:<10} {}", l.line_id, l.event_id, l.template);
        }
        out
    }

    pub fn clusters_table(&self) -> String {
        let mut out = format!("{:<8} {:<10} {:<8} {}\n", "Cluster", "EventId", "Size", "Template");
        for c in &self.clusters {
            let _ = writeln!(out, "{:<8} {:<10} {:<8} {}", c.cluster, c.event_id, c.size, c.template);
        }
        out
    }

    pub fn templates_csv<W: io::Write>(&self, out: W) -> csv::Result<()> {
        write_csv(out, &self.templates)
    }

    pub fn lines_csv<W: io::Write>(&self, out: W) -> csv::Result<()> {
        write_csv(out, &self.lines)
    }

    /// Member ids go in one space-separated column.
    pub fn clusters_csv<W: io::Write>(&self, out: W) -> csv::Result<()> {
        let mut wtr = csv::Writer::from_writer(out);
        wtr.write_record(["Cluster", "EventId", "EventTemplate", "Size", "MemberIds"])?;
        for c in &self.clusters {
            let members = itertools::join(&c.member_ids, " ");
            wtr.write_record([
                c.cluster.to_string(),
                c.event_id.clone(),
                c.template.clone(),
                c.size.to_string(),
                members,
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn write_csv<W: io::Write, T: Serialize>(out: W, rows: &[T]) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
