//! Classifier implementations

pub mod classifier;
pub mod loader;
pub mod onnx;

pub use classifier::{Classifier, FixedClassifier};
pub use loader::ModelLoader;
pub use onnx::OnnxClassifier;
