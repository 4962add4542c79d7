pub mod adb_error;
