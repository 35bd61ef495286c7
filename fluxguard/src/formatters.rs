//! Report formatting for CI logs, dashboards and documentation.
//!
//! # Examples
//!
//! ```rust
//! use fluxguard::formatters::{FormatterConfig, HumanFormatter, ReportFormatter};
//! use fluxguard::gate::{GateConfig, GateInputs, IncoherenceGate};
//!
//! let gate = IncoherenceGate::new(GateConfig::default()).unwrap();
//! let report = gate.evaluate(&GateInputs::new());
//!
//! let text = HumanFormatter::with_config(FormatterConfig::ci()).format(&report).unwrap();
//! assert!(text.contains("-> OK"));
//! ```

use std::fmt::{self, Write};

use serde_json::Value;

use crate::error::{FluxError, Result};
use crate::gate::{AppliedNullMode, Decision, IncoherenceReport, MeasurementStatus, SourceRef};
use crate::report::{quantize, DEFAULT_DIGITS};

/// Configuration options for formatting reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatterConfig {
    /// Include per-component details
    pub include_components: bool,
    /// Whether to use colorized output (for human formatter)
    pub use_colors: bool,
    /// Whether to include the report timestamp
    pub include_timestamps: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            include_components: true,
            use_colors: true,
            include_timestamps: true,
        }
    }
}

impl FormatterConfig {
    /// Only the score and the decision.
    pub fn minimal() -> Self {
        Self {
            include_components: false,
            use_colors: false,
            include_timestamps: false,
        }
    }

    /// Everything, with colors.
    pub fn detailed() -> Self {
        Self::default()
    }

    /// Plain text suitable for CI logs.
    pub fn ci() -> Self {
        Self {
            include_components: true,
            use_colors: false,
            include_timestamps: true,
        }
    }

    pub fn with_components(mut self, include: bool) -> Self {
        self.include_components = include;
        self
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn with_timestamps(mut self, include: bool) -> Self {
        self.include_timestamps = include;
        self
    }
}

/// Formats an [`IncoherenceReport`] into a string.
pub trait ReportFormatter {
    fn format(&self, report: &IncoherenceReport) -> Result<String>;

    /// Formats with an explicit configuration. The default ignores `config`.
    fn format_with_config(
        &self,
        report: &IncoherenceReport,
        _config: &FormatterConfig,
    ) -> Result<String> {
        self.format(report)
    }
}

fn render_error(e: fmt::Error) -> FluxError {
    FluxError::internal(format!("failed to render report: {e}"))
}

fn source_label(source: &Option<SourceRef>) -> String {
    source
        .as_ref()
        .map_or_else(|| "none".to_string(), |s| s.path.display().to_string())
}

fn opt<T: fmt::Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn status_tag(status: MeasurementStatus) -> &'static str {
    match status {
        MeasurementStatus::Measured => "measured",
        MeasurementStatus::NotMeasured => "not measured",
    }
}

/// Canonical JSON: sorted keys, floats rounded to 12 digits.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    config: FormatterConfig,
    pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            pretty: true,
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            pretty: true,
        }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for JsonFormatter {
    fn format(&self, report: &IncoherenceReport) -> Result<String> {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(
        &self,
        report: &IncoherenceReport,
        config: &FormatterConfig,
    ) -> Result<String> {
        let mut value = quantize(serde_json::to_value(report)?, DEFAULT_DIGITS);
        if let Value::Object(map) = &mut value {
            if !config.include_components {
                map.remove("components");
            }
            if !config.include_timestamps {
                map.remove("generated_at_utc");
            }
        }
        let text = if self.pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        };
        Ok(text)
    }
}

/// Plain-text summary for CI logs.
#[derive(Debug, Clone)]
pub struct HumanFormatter {
    config: FormatterConfig,
}

impl HumanFormatter {
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }

    fn render(
        &self,
        out: &mut String,
        report: &IncoherenceReport,
        config: &FormatterConfig,
    ) -> fmt::Result {
        writeln!(out, "FluxGuard integrity check")?;
        if config.include_timestamps {
            writeln!(out, "  generated_at: {}", report.generated_at_utc.to_rfc3339())?;
        }
        let w = &report.weights;
        writeln!(
            out,
            "  weights: w_null={:.3} w_drift={:.3} w_void={:.3}",
            w.w_null, w.w_drift, w.w_void
        )?;

        if config.include_components {
            let c = &report.components;
            writeln!(out, "  components:")?;
            writeln!(
                out,
                "    nulltrace: [{}] source={} mode={} runs={} failed_runs={} min_score={} -> v_null={:.6}",
                status_tag(c.nulltrace.status),
                source_label(&c.nulltrace.source),
                c.nulltrace
                    .null_mode
                    .map_or("-", |m| match m {
                        AppliedNullMode::FailedRatio => "failed_ratio",
                        AppliedNullMode::MinScore => "min_score",
                    }),
                opt(&c.nulltrace.runs),
                opt(&c.nulltrace.failed_runs),
                opt(&c.nulltrace.min_score),
                report.violations.v_null
            )?;
            writeln!(
                out,
                "    voidmark : [{}] source={} var_entropy_bits={} limit={} -> v_void={:.6}",
                status_tag(c.voidmark.status),
                source_label(&c.voidmark.source),
                opt(&c.voidmark.var_entropy_bits),
                c.voidmark.limit_var_entropy_bits,
                report.violations.v_void
            )?;
            writeln!(
                out,
                "    drift    : [{}] strategy={} baseline={} current={} signal={} -> v_drift={:.6}",
                status_tag(c.drift.status),
                c.drift.strategy,
                opt(&c.drift.baseline),
                opt(&c.drift.current),
                c.drift.signal,
                report.violations.v_drift
            )?;
        }

        let decision = if config.use_colors {
            match report.decision {
                Decision::Block => format!("\x1b[31m{}\x1b[0m", report.decision),
                Decision::Ok => format!("\x1b[32m{}\x1b[0m", report.decision),
            }
        } else {
            report.decision.to_string()
        };
        writeln!(
            out,
            "  incoherence_score: {:.6} (threshold={:.6}) -> {}",
            report.incoherence_score, report.threshold, decision
        )
    }
}

impl Default for HumanFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for HumanFormatter {
    fn format(&self, report: &IncoherenceReport) -> Result<String> {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(
        &self,
        report: &IncoherenceReport,
        config: &FormatterConfig,
    ) -> Result<String> {
        let mut out = String::new();
        self.render(&mut out, report, config).map_err(render_error)?;
        Ok(out)
    }
}

/// Markdown summary for PR comments and job summaries.
#[derive(Debug, Clone)]
pub struct MarkdownFormatter {
    config: FormatterConfig,
    heading_level: u8,
}

impl MarkdownFormatter {
    pub fn new() -> Self {
        Self {
            config: FormatterConfig::default(),
            heading_level: 2,
        }
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self {
            config,
            heading_level: 2,
        }
    }

    /// Heading level of the title, clamped to 1..=6.
    pub fn with_heading_level(mut self, level: u8) -> Self {
        self.heading_level = level.clamp(1, 6);
        self
    }

    fn render(
        &self,
        out: &mut String,
        report: &IncoherenceReport,
        config: &FormatterConfig,
    ) -> fmt::Result {
        let hashes = "#".repeat(usize::from(self.heading_level));
        let icon = if report.is_block() { "❌" } else { "✅" };
        writeln!(out, "{hashes} {icon} FluxGuard: {}", report.decision)?;
        writeln!(out)?;
        writeln!(
            out,
            "**Incoherence score:** {:.6} (threshold {:.6})",
            report.incoherence_score, report.threshold
        )?;
        if config.include_timestamps {
            writeln!(out)?;
            writeln!(out, "_Generated at {}_", report.generated_at_utc.to_rfc3339())?;
        }

        if config.include_components {
            let c = &report.components;
            let w = &report.weights;
            writeln!(out)?;
            writeln!(out, "| Component | Status | Weight | Violation | Source |")?;
            writeln!(out, "|-----------|--------|--------|-----------|--------|")?;
            writeln!(
                out,
                "| nulltrace | {} | {} | {:.6} | {} |",
                status_tag(c.nulltrace.status),
                w.w_null,
                report.violations.v_null,
                source_label(&c.nulltrace.source)
            )?;
            writeln!(
                out,
                "| drift | {} | {} | {:.6} | {} |",
                status_tag(c.drift.status),
                w.w_drift,
                report.violations.v_drift,
                opt(&c.drift.current)
            )?;
            writeln!(
                out,
                "| voidmark | {} | {} | {:.6} | {} |",
                status_tag(c.voidmark.status),
                w.w_void,
                report.violations.v_void,
                source_label(&c.voidmark.source)
            )?;
        }
        Ok(())
    }
}

impl Default for MarkdownFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for MarkdownFormatter {
    fn format(&self, report: &IncoherenceReport) -> Result<String> {
        self.format_with_config(report, &self.config)
    }

    fn format_with_config(
        &self,
        report: &IncoherenceReport,
        config: &FormatterConfig,
    ) -> Result<String> {
        let mut out = String::new();
        self.render(&mut out, report, config).map_err(render_error)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::gate::{GateConfig, GateInputs, IncoherenceGate};
    use crate::sources::{ResolvedSummary, SoakSummary};

    fn blocked_report() -> IncoherenceReport {
        let gate = IncoherenceGate::new(GateConfig::default()).unwrap();
        let inputs = GateInputs::new().with_soak(ResolvedSummary {
            label: "nulltrace".into(),
            path: "ci/nulltrace_summary.json".into(),
            summary: SoakSummary {
                runs: 4,
                failed_runs: 4,
                min_score: None,
            },
        });
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        gate.evaluate_at(&inputs, at)
    }

    #[test]
    fn test_json_formatter_filters() {
        let report = blocked_report();
        let full = JsonFormatter::new().format(&report).unwrap();
        assert!(full.contains("\"generated_at_utc\""));
        assert!(full.contains("\"BLOCK\""));

        let minimal = JsonFormatter::with_config(FormatterConfig::minimal())
            .with_pretty(false)
            .format(&report)
            .unwrap();
        let value: Value = serde_json::from_str(&minimal).unwrap();
        assert!(value.get("components").is_none());
        assert!(value.get("generated_at_utc").is_none());
        assert_eq!(value["incoherence_score"], 0.3);
    }

    #[test]
    fn test_human_formatter() {
        let text = HumanFormatter::with_config(FormatterConfig::ci())
            .format(&blocked_report())
            .unwrap();
        assert!(text.contains("weights: w_null=0.300 w_drift=0.400 w_void=0.300"));
        assert!(text.contains("nulltrace: [measured] source=ci/nulltrace_summary.json mode=failed_ratio"));
        assert!(text.contains("voidmark : [not measured] source=none"));
        assert!(text.contains("-> BLOCK"));
        assert!(text.contains("2026-01-02T03:04:05+00:00"));
        assert!(!text.contains("\x1b["));
    }

    #[test]
    fn test_human_formatter_colors() {
        let text = HumanFormatter::new().format(&blocked_report()).unwrap();
        assert!(text.contains("\x1b[31mBLOCK\x1b[0m"));
    }

    #[test]
    fn test_markdown_formatter() {
        let text = MarkdownFormatter::new()
            .with_heading_level(3)
            .format(&blocked_report())
            .unwrap();
        assert!(text.starts_with("### ❌ FluxGuard: BLOCK"));
        assert!(text.contains("| voidmark | not measured |"));
    }
}
