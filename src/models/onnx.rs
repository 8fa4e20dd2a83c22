//! ONNX Runtime classifier

use crate::config::ClassifierConfig;
use crate::feature_extractor::FeatureExtractor;
use crate::models::classifier::Classifier;
use crate::models::loader::{LoadedModel, ModelLoader};
use crate::types::transaction::TransactionRecord;
use crate::types::verdict::ClassifierSignal;
use anyhow::{Context, Result};
use ort::memory::Allocator;
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType};
use std::path::Path;
use std::sync::RwLock;
use tracing::debug;

/// Binary classifier backed by an ONNX model file.
///
/// The fraud-class probability is compared against `probability_threshold`
/// to produce the label.
pub struct OnnxClassifier {
    /// Session needs `&mut` to run, hence the lock
    model: RwLock<LoadedModel>,
    name: String,
    extractor: FeatureExtractor,
    probability_threshold: f64,
}

impl OnnxClassifier {
    /// Load the model named in the classifier configuration
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        if !Path::new(&config.model_path).exists() {
            anyhow::bail!("Model file not found: {}", config.model_path);
        }

        let loader = ModelLoader::with_threads(config.onnx_threads)?;
        let model = loader.load(&config.model_path)?;
        let name = model.name.clone();
        let extractor = FeatureExtractor::new();
        debug!(model = %name, features = ?extractor.feature_names(), "Model input features");

        Ok(Self {
            model: RwLock::new(model),
            name,
            extractor,
            probability_threshold: config.probability_threshold,
        })
    }

    /// Fraud-class probability for one record
    pub fn fraud_probability(&self, record: &TransactionRecord) -> Result<f64> {
        use ort::value::Tensor;

        let features = self.extractor.extract(record);
        let shape = vec![1_i64, self.extractor.feature_count() as i64];
        let input_tensor =
            Tensor::from_array((shape, features)).context("Failed to create input tensor")?;

        let mut model = self
            .model
            .write()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        let LoadedModel {
            session,
            input_name,
            output_name,
            ..
        } = &mut *model;

        let outputs = session.run(ort::inputs![input_name.as_str() => input_tensor])?;

        let probability = extract_probability(&outputs, output_name)
            .with_context(|| format!("Model {} produced no usable probability", self.name))?;

        debug!(model = %self.name, probability = probability, "Classifier inference complete");
        Ok(probability)
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, record: &TransactionRecord) -> Result<ClassifierSignal> {
        let probability = self.fraud_probability(record)?;
        Ok(ClassifierSignal::from(
            probability >= self.probability_threshold,
        ))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Read the fraud-class probability from either a `[batch, classes]` float
/// tensor or a `seq(map(int64, float))` output, whichever the exporter used.
fn extract_probability(outputs: &ort::session::SessionOutputs, output_name: &str) -> Result<f64> {
    if let Some(output) = outputs.get(output_name) {
        if let Some(prob) = probability_from_value(&output)? {
            return Ok(prob);
        }
    }

    for (name, output) in outputs.iter() {
        if name.contains("label") {
            continue;
        }
        if let Some(prob) = probability_from_value(&output)? {
            debug!(output = %name, "Probability read from fallback output");
            return Ok(prob);
        }
    }

    anyhow::bail!("no probability output found")
}

fn probability_from_value(output: &ort::value::DynValue) -> Result<Option<f64>> {
    if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
        let dims: Vec<i64> = shape.iter().copied().collect();
        return Ok(fraud_prob_from_tensor(&dims, data));
    }

    if DynSequenceValueType::can_downcast(&output.dtype()) {
        return fraud_prob_from_sequence_map(output).map(Some);
    }

    Ok(None)
}

/// Class 1 column of a probability tensor, or the single score when the
/// model emits one column.
fn fraud_prob_from_tensor(dims: &[i64], data: &[f32]) -> Option<f64> {
    let classes = match dims {
        [_, classes] | [classes] => *classes,
        _ => return None,
    };

    match classes {
        c if c >= 2 => data.get(1).map(|&p| p as f64),
        1 => data.first().map(|&p| p as f64),
        _ => None,
    }
}

fn fraud_prob_from_sequence_map(output: &ort::value::DynValue) -> Result<f64> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| anyhow::anyhow!("Failed to downcast to sequence: {}", e))?;
    let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;
    let first = maps
        .first()
        .ok_or_else(|| anyhow::anyhow!("Empty probability sequence"))?;

    let class_probs = first.try_extract_key_values::<i64, f32>()?;

    if let Some((_, prob)) = class_probs.iter().find(|(class, _)| *class == 1) {
        return Ok(*prob as f64);
    }
    if let Some((_, prob)) = class_probs.iter().find(|(class, _)| *class == 0) {
        return Ok(1.0 - *prob as f64);
    }

    anyhow::bail!("probability map has neither class 0 nor class 1")
}
