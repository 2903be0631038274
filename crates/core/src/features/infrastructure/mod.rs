pub mod json_feature_reader;
