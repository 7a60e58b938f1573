//! Integration tests for the icu4c-dist binary

mod helpers;
mod test_build;
mod test_publish;
