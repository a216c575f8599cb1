//! AES-256-ECB decryption for chunk data and the directory-index blob

use aes::{
    cipher::{generic_array::GenericArray, BlockDecrypt, BlockEncrypt, BlockSizeUser, KeyInit},
    Aes256,
};

use crate::error::Error;

/// Block size every encrypted buffer must be a multiple of
pub const ENCRYPTION_ALIGN: u64 = 16;

/// Raw 256-bit AES key material
pub type EncryptionKey = [u8; 32];

/// Build an AES-256 cipher from raw key bytes
pub fn cipher(key: &EncryptionKey) -> Aes256 {
    Aes256::new(GenericArray::from_slice(key))
}

/// Decrypt `data` in place, ECB mode, one 16-byte block at a time.
///
/// `data.len()` must be a multiple of 16; this is guaranteed by construction for
/// blocks read off a container (compressed sizes are always rounded up to 16 before
/// the read), but is still checked here since this function is also reachable from
/// the directory-index path with a caller-supplied blob length.
pub fn decrypt(aes: &Aes256, data: &mut [u8]) -> Result<(), Error> {
    if data.len() % Aes256::block_size() != 0 {
        return Err(Error::decrypt_failed(format!(
            "buffer length {} is not a multiple of the AES block size",
            data.len()
        )));
    }

    data.chunks_mut(Aes256::block_size())
        .map(GenericArray::from_mut_slice)
        .for_each(|block| aes.decrypt_block(block));

    Ok(())
}

/// Encrypt `data` in place, ECB mode, one 16-byte block at a time.
///
/// No production code path in a read-only crate calls this; it exists as the natural
/// counterpart of [`decrypt`] so this crate's own tests (and `tests/iostore.rs`) can
/// build encrypted fixtures without hand-rolling AES.
pub fn encrypt(aes: &Aes256, data: &mut [u8]) -> Result<(), Error> {
    if data.len() % Aes256::block_size() != 0 {
        return Err(Error::decrypt_failed(format!(
            "buffer length {} is not a multiple of the AES block size",
            data.len()
        )));
    }

    data.chunks_mut(Aes256::block_size())
        .map(GenericArray::from_mut_slice)
        .for_each(|block| aes.encrypt_block(block));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{cipher, decrypt, encrypt};

    #[test]
    fn decrypts_what_it_encrypts() {
        let key = [7u8; 32];
        let aes = cipher(&key);

        let mut data = (0u8..32).collect::<Vec<_>>();
        let plaintext = data.clone();

        encrypt(&aes, &mut data).unwrap();
        assert_ne!(data, plaintext);

        decrypt(&aes, &mut data).unwrap();
        assert_eq!(data, plaintext);
    }

    #[test]
    fn rejects_unaligned_buffers() {
        let aes = cipher(&[0u8; 32]);
        let mut data = vec![0u8; 17];
        assert!(decrypt(&aes, &mut data).is_err());
    }
}
