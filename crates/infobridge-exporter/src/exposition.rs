//! Prometheus text exposition format.
//!
//! Groups scraped samples into metric families and renders them with the
//! `prometheus` crate's text encoder.

use std::collections::BTreeMap;

use prometheus::proto::{Gauge, LabelPair, Metric, MetricFamily, MetricType};
use prometheus::{Encoder, TextEncoder};

use infobridge_core::Sample;

use crate::error::{CollectError, CollectResult};

/// Content type of the text exposition format.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Build one family per exported name, ordered by name.
///
/// Samples keep their scrape order within a family.
pub fn to_metric_families(samples: &[Sample]) -> Vec<MetricFamily> {
    let mut families: BTreeMap<&str, MetricFamily> = BTreeMap::new();

    for sample in samples {
        let descriptor = &sample.descriptor;
        let family = families.entry(descriptor.fq_name.as_str()).or_insert_with(|| {
            let mut mf = MetricFamily::default();
            mf.set_name(descriptor.fq_name.clone());
            mf.set_help(descriptor.help.clone());
            mf.set_field_type(MetricType::GAUGE);
            mf
        });
        family.mut_metric().push(to_metric(sample));
    }

    families.into_values().collect()
}

fn to_metric(sample: &Sample) -> Metric {
    let labels: Vec<LabelPair> = sample
        .labels()
        .map(|(name, value)| {
            let mut lp = LabelPair::default();
            lp.set_name(name.to_string());
            lp.set_value(value.to_string());
            lp
        })
        .collect();

    let mut m = Metric::default();
    m.set_label(labels);
    let mut g = Gauge::default();
    g.set_value(sample.value);
    m.set_gauge(g);
    m
}

/// Render samples as Prometheus text.
pub fn encode_text(samples: &[Sample]) -> CollectResult<String> {
    let families = to_metric_families(samples);
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| CollectError::Encode(prometheus::Error::Msg(e.to_string())))
}
