//! Competitor selection pipeline, traced step by step
use serde_json::{json, Value};
use thiserror::Error;
use tracing::info;
use xray_core::{Decision, DecisionOutcome, Evaluation, Payload, TraceBuilder};

use crate::catalog::{self, Product};

const STOPWORDS: &[&str] = &["the", "for", "and", "with", "oz", "of", "a"];

#[derive(Error, Debug, PartialEq)]
pub enum DemoError {
    #[error("SEARCH/{0}")]
    Search(String),

    #[error("FILTER/no candidate passed the thresholds")]
    NoCandidates,
}

#[derive(Debug, Clone)]
pub struct Thresholds {
    pub min_price_ratio: f64,
    pub max_price_ratio: f64,
    pub min_rating: f64,
    pub min_reviews: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_price_ratio: 0.5,
            max_price_ratio: 2.0,
            min_rating: 3.8,
            min_reviews: 100,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub thresholds: Thresholds,
    /// Make the search stage fail
    pub fail_search: bool,
    pub search_limit: Option<usize>,
}

/// Run the pipeline for `reference` and close the trace accordingly.
pub fn run(
    reference: &Product,
    options: &PipelineOptions,
) -> (TraceBuilder, Result<Product, DemoError>) {
    let mut trace = TraceBuilder::new("Competitor Selection");
    let result = select_competitor(&mut trace, reference, options);
    match &result {
        Ok(selected) => trace.mark_complete(Some(format!(
            "Selected {} ({})",
            selected.asin, selected.title
        ))),
        Err(e) => trace.mark_failed(Some(&e.to_string())),
    }
    (trace, result)
}

fn select_competitor(
    trace: &mut TraceBuilder,
    reference: &Product,
    options: &PipelineOptions,
) -> Result<Product, DemoError> {
    let keywords = generate_keywords(&reference.title);
    trace.add_step(
        "keyword_generation",
        payload(json!({ "title": reference.title })),
        payload(json!({ "keywords": keywords })),
        format!("Extracted {} keywords from the product title", keywords.len()),
        Some(Decision::new(DecisionOutcome::Pass, "keywords generated").with_confidence(0.85)),
        None,
    );

    let limit = options.search_limit.unwrap_or(10);
    let candidates = catalog::search(&keywords, limit);
    trace.add_step(
        "candidate_search",
        payload(json!({ "keywords": keywords, "limit": limit })),
        payload(json!({ "candidates": candidates, "total": candidates.len() })),
        format!("Mock search returned {} candidates", candidates.len()),
        None,
        None,
    );
    if options.fail_search {
        return Err(DemoError::Search("search backend timed out".to_string()));
    }

    let t = &options.thresholds;
    let evaluations: Vec<Evaluation> = candidates
        .iter()
        .map(|c| evaluate(c, reference, t))
        .collect();
    let passed: Vec<&Product> = candidates
        .iter()
        .zip(&evaluations)
        .filter(|(_, e)| e.passed)
        .map(|(c, _)| c)
        .collect();
    trace.add_evaluation_step(
        "apply_filters",
        payload(json!({
            "candidates": candidates.len(),
            "thresholds": {
                "minPrice": reference.price * t.min_price_ratio,
                "maxPrice": reference.price * t.max_price_ratio,
                "minRating": t.min_rating,
                "minReviews": t.min_reviews,
            }
        })),
        &evaluations,
        payload(json!({ "passed": passed.len(), "failed": candidates.len() - passed.len() })),
        format!("{} of {} candidates passed all thresholds", passed.len(), candidates.len()),
        None,
    );

    let mut ranked: Vec<(f64, &Product)> = passed.into_iter().map(|p| (score(p), p)).collect();
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
    let Some((best_score, best)) = ranked.first().copied() else {
        trace.add_step(
            "rank_and_select",
            Payload::new(),
            Payload::new(),
            "Nothing left to rank",
            Some(Decision::new(DecisionOutcome::Fail, "empty candidate set")),
            None,
        );
        return Err(DemoError::NoCandidates);
    };

    let runner_up = ranked.get(1).map(|(s, _)| *s).unwrap_or(0.0);
    let ranking: Vec<Value> = ranked
        .iter()
        .enumerate()
        .map(|(i, (s, p))| json!({ "rank": i + 1, "asin": p.asin, "score": s }))
        .collect();
    trace.add_step(
        "rank_and_select",
        payload(json!({ "candidates": ranked.len() })),
        payload(json!({ "selected": best })),
        format!("{} scored highest on rating and review volume", best.title),
        Some(
            Decision::new(DecisionOutcome::Select, format!("best score {:.3}", best_score))
                .with_confidence(margin_confidence(best_score, runner_up)),
        ),
        Some(payload(json!({ "ranking": ranking }))),
    );

    info!(asin = %best.asin, score = best_score, "competitor selected");
    Ok(best.clone())
}

fn generate_keywords(title: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for word in title.split(|c: char| !c.is_alphanumeric()) {
        let word = word.to_lowercase();
        if word.len() < 3
            || STOPWORDS.contains(&word.as_str())
            || word.chars().any(|c| c.is_ascii_digit())
        {
            continue;
        }
        if !keywords.contains(&word) {
            keywords.push(word);
        }
    }
    keywords
}

fn evaluate(candidate: &Product, reference: &Product, t: &Thresholds) -> Evaluation {
    let min_price = reference.price * t.min_price_ratio;
    let max_price = reference.price * t.max_price_ratio;

    let mut failures = Vec::new();
    if candidate.price < min_price || candidate.price > max_price {
        failures.push(format!(
            "price {:.2} outside {:.2}-{:.2}",
            candidate.price, min_price, max_price
        ));
    }
    if candidate.rating < t.min_rating {
        failures.push(format!("rating {} below {}", candidate.rating, t.min_rating));
    }
    if candidate.reviews < t.min_reviews {
        failures.push(format!("{} reviews below {}", candidate.reviews, t.min_reviews));
    }

    let reason = if failures.is_empty() {
        "passes all thresholds".to_string()
    } else {
        failures.join("; ")
    };
    Evaluation::new(candidate.asin.clone(), failures.is_empty(), reason).with_metadata(payload(
        json!({
            "title": candidate.title,
            "price": candidate.price,
            "rating": candidate.rating,
            "reviews": candidate.reviews,
        }),
    ))
}

/// Rating weighted by log-scaled review volume
fn score(p: &Product) -> f64 {
    (p.rating / 5.0) * 0.7 + ((p.reviews as f64).ln_1p() / 10.0).min(1.0) * 0.3
}

fn margin_confidence(best: f64, runner_up: f64) -> f64 {
    (0.5 + (best - runner_up) * 5.0).min(0.99)
}

fn payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        other => {
            let mut map = Payload::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xray_core::ExecutionStatus;

    fn reference() -> Product {
        Product {
            asin: "B0REF".to_string(),
            title: "ProBrand Steel Bottle 32oz Insulated".to_string(),
            price: 29.99,
            rating: 4.2,
            reviews: 1287,
        }
    }

    #[test]
    fn test_keywords_skip_noise() {
        assert_eq!(
            generate_keywords("ProBrand Steel Bottle 32oz Insulated"),
            vec!["probrand", "steel", "bottle", "insulated"]
        );
    }

    #[test]
    fn test_successful_run_traces_four_steps() {
        let (trace, result) = run(&reference(), &PipelineOptions::default());
        let selected = result.unwrap();

        let execution = trace.execution();
        assert_eq!(execution.status, ExecutionStatus::Completed);
        let names: Vec<&str> = execution.steps.iter().map(|s| s.step.as_str()).collect();
        assert_eq!(
            names,
            vec!["keyword_generation", "candidate_search", "apply_filters", "rank_and_select"]
        );

        let filter = &execution.steps[2];
        assert!(!filter.evaluations().is_empty());
        assert!(filter.evaluations().iter().any(|e| !e.passed));

        let summary = execution.summary.as_ref().unwrap();
        assert_eq!(summary.total_steps, 4);
        assert!(summary.final_outcome.as_ref().unwrap().contains(&selected.asin));
    }

    #[test]
    fn test_failed_search_annotates_last_step() {
        let options = PipelineOptions {
            fail_search: true,
            ..PipelineOptions::default()
        };
        let (trace, result) = run(&reference(), &options);

        assert!(matches!(result, Err(DemoError::Search(_))));
        let execution = trace.execution();
        assert_eq!(execution.status, ExecutionStatus::Failed);
        assert_eq!(execution.steps.len(), 2);
        assert!(execution.steps[1]
            .reasoning
            .ends_with(" [ERROR: SEARCH/search backend timed out]"));
        assert!(execution.summary.is_none());
    }

    #[test]
    fn test_strict_thresholds_fail_selection() {
        let options = PipelineOptions {
            thresholds: Thresholds {
                min_rating: 5.0,
                ..Thresholds::default()
            },
            ..PipelineOptions::default()
        };
        let (trace, result) = run(&reference(), &options);
        assert_eq!(result, Err(DemoError::NoCandidates));
        assert_eq!(trace.status(), ExecutionStatus::Failed);
        assert_eq!(trace.steps().last().unwrap().step, "rank_and_select");
    }
}
