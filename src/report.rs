//! Plain-text defect reports for sharing a detection session.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::catalog::DefectClass;
use crate::history::DetectionRecord;

/// Count of detections per class, in catalog order.
pub fn class_counts(record: &DetectionRecord) -> BTreeMap<DefectClass, usize> {
    let mut counts = BTreeMap::new();
    for d in &record.detections {
        *counts.entry(d.class_name).or_insert(0) += 1;
    }
    counts
}

/// Render a shareable report for `record`.
///
/// Defects are listed in detection order as `"{n}. {code} - {pct}% confidence"`.
pub fn report_message(record: &DetectionRecord) -> String {
    let mut message = String::from("Road Defect Report\n\n");

    let _ = writeln!(
        message,
        "Date: {}",
        record.recorded_at.format("%b %-d, %Y at %H:%M UTC")
    );
    let _ = writeln!(message, "Defects Found: {}", record.detections.len());

    if let Some(location) = &record.location {
        let _ = writeln!(message, "Location: {}, {}", location.latitude, location.longitude);
        if let Some(address) = &location.address {
            let _ = writeln!(message, "Address: {}", address);
        }
    }

    message.push_str("\nDefect Details:\n");
    for (index, detection) in record.detections.iter().enumerate() {
        let _ = writeln!(
            message,
            "{}. {} - {}% confidence",
            index + 1,
            detection.class_name.code(),
            detection.confidence_percent()
        );
    }

    let counts = class_counts(record);
    if !counts.is_empty() {
        message.push_str("\nSummary:\n");
        for (class, count) in counts {
            let _ = writeln!(message, "{} ({}): {}", class.description(), class.code(), count);
        }
    }

    message
}
