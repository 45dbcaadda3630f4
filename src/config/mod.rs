pub mod classifier_config;
