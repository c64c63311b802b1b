use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use tracing::debug;

/// One step of range-query post-processing. Stages must keep the number of
/// points unchanged and must not have side effects.
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, points: Vec<Value>) -> Vec<Value>;
}

/// Cluster assignment for points. Identity until a clustering model exists.
pub struct ClusterEnhancement;

impl Stage for ClusterEnhancement {
    fn name(&self) -> &'static str {
        "cluster_enhancement"
    }

    fn apply(&self, points: Vec<Value>) -> Vec<Value> {
        points
    }
}

/// Sentiment scoring for points. Identity.
pub struct SentimentScoring;

impl Stage for SentimentScoring {
    fn name(&self) -> &'static str {
        "sentiment_scoring"
    }

    fn apply(&self, points: Vec<Value>) -> Vec<Value> {
        points
    }
}

/// Coordinate normalization. Identity.
pub struct CoordinateNormalization;

impl Stage for CoordinateNormalization {
    fn name(&self) -> &'static str {
        "coordinate_normalization"
    }

    fn apply(&self, points: Vec<Value>) -> Vec<Value> {
        points
    }
}

/// Ordered stages applied to upstream points before they are cached.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
    processed_by: String,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>, processed_by: impl Into<String>) -> Self {
        Self {
            stages,
            processed_by: processed_by.into(),
        }
    }

    /// Clustering, then sentiment scoring, then normalization.
    pub fn standard(processed_by: impl Into<String>) -> Self {
        Self::new(
            vec![
                Box::new(ClusterEnhancement),
                Box::new(SentimentScoring),
                Box::new(CoordinateNormalization),
            ],
            processed_by,
        )
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    pub fn run(&self, points: Vec<Value>) -> Vec<Value> {
        self.stages.iter().fold(points, |points, stage| {
            let before = points.len();
            let points = stage.apply(points);
            debug_assert_eq!(before, points.len(), "stage {} changed point count", stage.name());
            points
        })
    }

    /// Wraps the processed points of an upstream body. Bodies without a
    /// `points` array are returned untouched.
    pub fn process(&self, body: Value) -> Value {
        let points = match body {
            Value::Object(mut map) => match map.remove("points") {
                Some(Value::Array(points)) => points,
                Some(other) => {
                    map.insert("points".to_string(), other);
                    return Value::Object(map);
                }
                None => return Value::Object(map),
            },
            other => return other,
        };

        debug!("Processing {} points through {} stages", points.len(), self.stages.len());

        json!({
            "points": self.run(points),
            "processed": true,
            "processedAt": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            "processedBy": self.processed_by,
        })
    }
}
