pub mod archive;
pub mod classifier;
pub mod discovery;
pub mod error;
pub mod locator;
pub mod model;
pub mod progress;
pub mod report;
pub mod resolver;
pub mod runtime;
pub mod unique;
pub mod validator;
