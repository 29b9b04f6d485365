//! FourCC subcommand definitions

use clap::Subcommand;

#[derive(Subcommand)]
pub enum FourccCommand {
    /// Pack a 4-character id into its script integer
    Encode {
        /// Id to pack (e.g. "hfoo")
        id: String,
    },

    /// Unpack a script integer into an id
    Decode {
        /// Packed integer (e.g. 1751543663)
        value: String,
    },
}
