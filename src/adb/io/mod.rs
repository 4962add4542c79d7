pub mod packet_io;
