mod private_key;
mod public_key;
mod signature;
