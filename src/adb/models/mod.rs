pub mod adb_packet;
