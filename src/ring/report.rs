use super::types::{Report, RingSnapshot};
use colored::Colorize;
use std::fmt::Write;

const PREVIEW_BYTES: usize = 16;

pub fn render_json(report: &Report) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    if report.rings.is_empty() {
        out.push_str(&format!("{}\n", "No rings registered.".yellow()));
        return out;
    }
    for ring in &report.rings {
        render_ring(&mut out, ring);
    }
    out
}

fn render_ring(out: &mut String, ring: &RingSnapshot) {
    let _ = writeln!(
        out,
        "{} {} {}/{} bytes, {} records",
        "●".cyan(),
        ring.name.as_str().bold(),
        ring.size,
        ring.max_size,
        ring.records.len()
    );
    let stats = &ring.stats;
    let _ = writeln!(
        out,
        "  appended {} ({} bytes), evicted {} ({} bytes)",
        stats.appended_records, stats.appended_bytes, stats.evicted_records, stats.evicted_bytes
    );
    for (status, count) in &stats.rejected {
        let _ = writeln!(out, "  {} {}", status.as_str().red(), count);
    }
    for (i, record) in ring.records.iter().enumerate() {
        let preview = hex::encode(&record[..record.len().min(PREVIEW_BYTES)]);
        let ellipsis = if record.len() > PREVIEW_BYTES { "…" } else { "" };
        let _ = writeln!(
            out,
            "  [{:>4}] {:>8} B  {}{}",
            i,
            record.len(),
            preview.as_str().dimmed(),
            ellipsis
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::{AppendStatus, RingStats};

    fn report() -> Report {
        let mut stats = RingStats::default();
        stats.record_success(2, 0, 0);
        stats.record_success(20, 1, 2);
        stats.record_failure(AppendStatus::FailIpBufferZero);
        Report {
            generated_at_ms: 1,
            rings: vec![RingSnapshot {
                name: "wifi_fw".to_string(),
                max_size: 32,
                size: 20,
                records: vec![(0..20).collect()],
                stats,
            }],
        }
    }

    #[test]
    fn json_encodes_records_as_hex() {
        let json: serde_json::Value =
            serde_json::from_str(&render_json(&report()).unwrap()).unwrap();
        let ring = &json["rings"][0];
        assert_eq!(ring["name"], "wifi_fw");
        assert_eq!(
            ring["records"][0],
            "000102030405060708090a0b0c0d0e0f10111213"
        );
        assert_eq!(ring["stats"]["evicted_records"], 1);
        assert_eq!(ring["stats"]["rejected"]["FAIL_IP_BUFFER_ZERO"], 1);
    }

    #[test]
    fn text_lists_records_with_preview() {
        let text = render_text(&report());
        assert!(text.contains("wifi_fw"));
        assert!(text.contains("20/32 bytes, 1 records"));
        assert!(text.contains("FAIL_IP_BUFFER_ZERO"));
        assert!(text.contains("000102030405060708090a0b0c0d0e0f"));
        assert!(!text.contains("10111213"));
    }

    #[test]
    fn text_handles_no_rings() {
        let text = render_text(&Report {
            generated_at_ms: 0,
            rings: Vec::new(),
        });
        assert!(text.contains("No rings registered."));
    }
}
