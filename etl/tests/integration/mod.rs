mod bridges_test;
mod calendar_test;
mod incremental_test;
mod reload_test;
mod validation_test;
