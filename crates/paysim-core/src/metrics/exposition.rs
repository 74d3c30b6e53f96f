//! Prometheus text exposition format (version 0.0.4).
//!
//! Writers emit one `# HELP` / `# TYPE` block per metric followed by its
//! series. The parser reads the same format back into flat samples; it is
//! what the round-trip tests and any tooling use to inspect a scrape.

use std::fmt::{self, Write};

use super::counter::CounterSnapshot;
use super::histogram::HistogramSnapshot;
use super::labels::LabelSet;
use super::{Desc, MetricKind};
use crate::error::{PaysimError, Result};

/// Content type served with a scrape.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Float rendering: integral values keep one fractional digit (`1.0`),
/// everything else uses the shortest round-trip form.
pub fn fmt_float(v: f64) -> String {
    if v.is_nan() {
        "NaN".into()
    } else if v == f64::INFINITY {
        "+Inf".into()
    } else if v == f64::NEG_INFINITY {
        "-Inf".into()
    } else if v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

fn escape_help(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\n', "\\n")
}

fn write_header(out: &mut impl Write, desc: &Desc, kind: MetricKind) -> fmt::Result {
    writeln!(out, "# HELP {} {}", desc.name, escape_help(&desc.help))?;
    writeln!(out, "# TYPE {} {}", desc.name, kind.as_str())
}

fn write_sample(out: &mut impl Write, name: &str, labels: &LabelSet, value: &str) -> fmt::Result {
    if labels.is_empty() {
        writeln!(out, "{name} {value}")
    } else {
        writeln!(out, "{name}{{{labels}}} {value}")
    }
}

pub fn write_counter(out: &mut impl Write, desc: &Desc, snap: &CounterSnapshot) -> fmt::Result {
    write_header(out, desc, MetricKind::Counter)?;
    for (labels, total) in &snap.series {
        write_sample(out, &desc.name, labels, &total.to_string())?;
    }
    Ok(())
}

pub fn write_gauge(out: &mut impl Write, desc: &Desc, value: f64) -> fmt::Result {
    write_header(out, desc, MetricKind::Gauge)?;
    write_sample(out, &desc.name, &LabelSet::default(), &fmt_float(value))
}

pub fn write_histogram(out: &mut impl Write, desc: &Desc, snap: &HistogramSnapshot) -> fmt::Result {
    write_header(out, desc, MetricKind::Histogram)?;
    let bucket_name = format!("{}_bucket", desc.name);
    for (labels, s) in &snap.series {
        let prefix = if labels.is_empty() {
            String::new()
        } else {
            format!("{labels},")
        };
        for (le, count) in &s.buckets {
            writeln!(out, "{bucket_name}{{{prefix}le=\"{}\"}} {count}", fmt_float(*le))?;
        }
        writeln!(out, "{bucket_name}{{{prefix}le=\"+Inf\"}} {}", s.count)?;
        write_sample(out, &format!("{}_sum", desc.name), labels, &fmt_float(s.sum))?;
        write_sample(out, &format!("{}_count", desc.name), labels, &s.count.to_string())?;
    }
    Ok(())
}

// --------------------
// Parsing
// --------------------

/// `# HELP` / `# TYPE` metadata of one metric family.
#[derive(Debug, Clone, PartialEq)]
pub struct Family {
    pub name: String,
    pub help: Option<String>,
    pub kind: Option<MetricKind>,
}

/// One sample line.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub name: String,
    pub labels: LabelSet,
    pub value: f64,
}

/// A parsed scrape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Exposition {
    pub families: Vec<Family>,
    pub samples: Vec<Sample>,
}

impl Exposition {
    pub fn family(&self, name: &str) -> Option<&Family> {
        self.families.iter().find(|f| f.name == name)
    }

    /// Value of the sample with this name and exactly these labels.
    pub fn value(&self, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
        let want = LabelSet::from_pairs(labels);
        self.samples
            .iter()
            .find(|s| s.name == name && s.labels == want)
            .map(|s| s.value)
    }

    fn family_mut(&mut self, name: &str) -> &mut Family {
        if let Some(i) = self.families.iter().position(|f| f.name == name) {
            return &mut self.families[i];
        }
        self.families.push(Family {
            name: name.to_string(),
            help: None,
            kind: None,
        });
        let last = self.families.len() - 1;
        &mut self.families[last]
    }
}

fn bad(line_no: usize, msg: impl fmt::Display) -> PaysimError {
    PaysimError::InvalidArgument(format!("exposition line {line_no}: {msg}"))
}

fn unescape(s: &str, line_no: usize) -> Result<String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('n') => out.push('\n'),
            other => return Err(bad(line_no, format!("bad escape \\{}", other.unwrap_or(' ')))),
        }
    }
    Ok(out)
}

pub fn parse_float(s: &str) -> Option<f64> {
    match s {
        "+Inf" | "Inf" => Some(f64::INFINITY),
        "-Inf" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        _ => s.parse().ok(),
    }
}

/// Parse `k="v",...}` starting right after `{`. Returns labels and the rest
/// of the line after the closing brace.
fn parse_labels(s: &str, line_no: usize) -> Result<(LabelSet, &str)> {
    let mut pairs = Vec::new();
    let mut rest = s.trim_start();
    loop {
        if let Some(after) = rest.strip_prefix('}') {
            return Ok((LabelSet::new(pairs), after));
        }
        let eq = rest.find('=').ok_or_else(|| bad(line_no, "label without '='"))?;
        let key = rest[..eq].trim().to_string();
        rest = rest[eq + 1..]
            .strip_prefix('"')
            .ok_or_else(|| bad(line_no, "label value must be quoted"))?;

        // find the closing quote, skipping escaped characters
        let mut end = None;
        let mut escaped = false;
        for (i, c) in rest.char_indices() {
            match (escaped, c) {
                (true, _) => escaped = false,
                (false, '\\') => escaped = true,
                (false, '"') => {
                    end = Some(i);
                    break;
                }
                _ => {}
            }
        }
        let end = end.ok_or_else(|| bad(line_no, "unterminated label value"))?;
        pairs.push((key, unescape(&rest[..end], line_no)?));
        rest = rest[end + 1..].trim_start();
        if let Some(after) = rest.strip_prefix(',') {
            rest = after.trim_start();
        } else if !rest.starts_with('}') {
            return Err(bad(line_no, "expected ',' or '}' after label"));
        }
    }
}

/// Parse a full scrape body.
pub fn parse(text: &str) -> Result<Exposition> {
    let mut exp = Exposition::default();
    for (i, raw) in text.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(comment) = line.strip_prefix('#') {
            let comment = comment.trim_start();
            if let Some(rest) = comment.strip_prefix("HELP ") {
                let (name, help) = rest.split_once(' ').unwrap_or((rest, ""));
                exp.family_mut(name).help = Some(unescape(help, line_no)?);
            } else if let Some(rest) = comment.strip_prefix("TYPE ") {
                let (name, kind) = rest
                    .split_once(' ')
                    .ok_or_else(|| bad(line_no, "TYPE without kind"))?;
                let kind = MetricKind::parse(kind.trim())
                    .ok_or_else(|| bad(line_no, format!("unknown metric type {kind:?}")))?;
                exp.family_mut(name).kind = Some(kind);
            }
            continue;
        }

        let name_end = line
            .find(|c: char| c == '{' || c.is_whitespace())
            .ok_or_else(|| bad(line_no, "sample without value"))?;
        let name = &line[..name_end];
        let (labels, rest) = if line[name_end..].starts_with('{') {
            parse_labels(&line[name_end + 1..], line_no)?
        } else {
            (LabelSet::default(), &line[name_end..])
        };
        // value, optionally followed by a timestamp
        let value_str = rest
            .split_whitespace()
            .next()
            .ok_or_else(|| bad(line_no, "sample without value"))?;
        let value = parse_float(value_str)
            .ok_or_else(|| bad(line_no, format!("bad sample value {value_str:?}")))?;
        exp.samples.push(Sample {
            name: name.to_string(),
            labels,
            value,
        });
    }
    Ok(exp)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn float_formatting() {
        assert_eq!(fmt_float(1.0), "1.0");
        assert_eq!(fmt_float(10.0), "10.0");
        assert_eq!(fmt_float(0.1), "0.1");
        assert_eq!(fmt_float(0.0), "0.0");
        assert_eq!(fmt_float(2.5), "2.5");
        assert_eq!(fmt_float(1e15), "1000000000000000.0");
        assert_eq!(fmt_float(-3e17), "-300000000000000000.0");
        assert_eq!(parse_float(&fmt_float(1e300)), Some(1e300));
        assert_eq!(fmt_float(f64::INFINITY), "+Inf");
        assert_eq!(fmt_float(f64::NEG_INFINITY), "-Inf");
        assert_eq!(fmt_float(f64::NAN), "NaN");
    }

    #[test]
    fn parses_labels_with_escapes() {
        let text = "# HELP x_total Things \\\\ stuff\n# TYPE x_total counter\nx_total{a=\"q\\\"uote\",b=\"line\\nbreak\"} 4\nx_total 1 1700000000\n";
        let exp = parse(text).unwrap();
        let fam = exp.family("x_total").unwrap();
        assert_eq!(fam.kind, Some(MetricKind::Counter));
        assert_eq!(fam.help.as_deref(), Some("Things \\ stuff"));
        assert_eq!(exp.value("x_total", &[("a", "q\"uote"), ("b", "line\nbreak")]), Some(4.0));
        assert_eq!(exp.value("x_total", &[]), Some(1.0));
    }

    #[test]
    fn parses_infinity_bucket() {
        let exp = parse("h_bucket{le=\"+Inf\"} 3\n").unwrap();
        assert_eq!(exp.value("h_bucket", &[("le", "+Inf")]), Some(3.0));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse("metric_without_value\n").is_err());
        assert!(parse("m{a=\"x} 1\n").is_err());
        assert!(parse("m{a=x} 1\n").is_err());
        assert!(parse("m abc\n").is_err());
        assert!(parse("# TYPE m summaryish\n").is_err());
    }
}
