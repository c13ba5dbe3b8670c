mod condition_tests;
mod flow_tests;
mod tree_tests;
mod validation_tests;
