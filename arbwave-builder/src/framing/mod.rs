//! Wire framing: data packets, the outbound container, and the packer that
//! groups framed packets into output frames

pub mod container;
pub mod packer;
pub mod packet;

pub use container::{ContainerHeader, CONTAINER_HEADER_BYTES, CONTAINER_TAG};
pub use packer::{PackedFrame, PacketPacker};
pub use packet::{Packet, PacketHeader, PacketTrailer};
