pub mod connection;
pub mod datagram_buffer;
pub mod receive_loop;
