// (c) 2025 fxfer developers

//! Stream plumbing shared by the request encoder and the response decoder
//!
//! # Exact-count reads
//!
//! Every fixed-size field of a response is read with [`read_field`], which keeps reading
//! until the field is complete. A single receive may return fewer bytes than asked for;
//! that is normal on TCP and does not indicate an error.
//! If the peer closes the connection part-way through a field, the read fails with
//! [`Error::ConnectionClosed`] naming the field.

use tokio::io::{AsyncRead, AsyncReadExt as _, AsyncWrite};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use crate::Error;

/////////////////////////////////////////////////////////////////////////////////////////////
// STREAM TYPEDEFS

/// Marker trait for streams used for sending data
pub trait SendingStream: AsyncWrite + Send + Unpin {}
impl SendingStream for OwnedWriteHalf {}

#[cfg(test)]
impl SendingStream for tokio_test::io::Mock {}

/// Marker trait for streams used for receiving data
pub trait ReceivingStream: AsyncRead + Send + Unpin {}
impl ReceivingStream for OwnedReadHalf {}

#[cfg(test)]
impl ReceivingStream for tokio_test::io::Mock {}

/// Syntactic sugar helper type
#[derive(Debug)]
pub struct SendReceivePair<S: SendingStream, R: ReceivingStream> {
    /// outbound data
    pub send: S,
    /// inbound data
    pub recv: R,
}

impl<S: SendingStream, R: ReceivingStream> From<(S, R)> for SendReceivePair<S, R> {
    fn from(value: (S, R)) -> Self {
        Self {
            send: value.0,
            recv: value.1,
        }
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////
// EXACT-COUNT READS

/// Fills `buf` completely from `reader`.
///
/// `field` names what is being read, for the error message.
pub(crate) async fn read_field<R>(
    reader: &mut R,
    buf: &mut [u8],
    field: &'static str,
) -> Result<(), Error>
where
    R: AsyncRead + Unpin,
{
    let expected = buf.len() as u64;
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err(Error::ConnectionClosed { field, expected })
        }
        Err(e) => Err(e.into()),
    }
}

/// Reads a single byte
pub(crate) async fn read_u8<R>(reader: &mut R, field: &'static str) -> Result<u8, Error>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; 1];
    read_field(reader, &mut buf, field).await?;
    Ok(buf[0])
}

/// Reads a big-endian u32
pub(crate) async fn read_u32<R>(reader: &mut R, field: &'static str) -> Result<u32, Error>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; 4];
    read_field(reader, &mut buf, field).await?;
    Ok(u32::from_be_bytes(buf))
}

/// Reads a big-endian u64
pub(crate) async fn read_u64<R>(reader: &mut R, field: &'static str) -> Result<u64, Error>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; 8];
    read_field(reader, &mut buf, field).await?;
    Ok(u64::from_be_bytes(buf))
}

/// Reads exactly `len` bytes of variable-length data.
///
/// The buffer grows as data arrives rather than being sized up front from `len`,
/// so a corrupt length cannot force a huge allocation on its own.
pub(crate) async fn read_vec<R>(
    reader: &mut R,
    len: u64,
    field: &'static str,
) -> Result<Vec<u8>, Error>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let got = (&mut *reader).take(len).read_to_end(&mut buf).await?;
    if (got as u64) < len {
        return Err(Error::ConnectionClosed {
            field,
            expected: len,
        });
    }
    Ok(buf)
}

/////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::{read_field, read_u32, read_u64, read_vec};
    use crate::Error;
    use pretty_assertions::assert_eq;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn fragmented_field() {
        let mut mock = Builder::new()
            .read(&[0x12])
            .read(&[0x34])
            .read(&[0x56, 0x78])
            .build();
        assert_eq!(read_u32(&mut mock, "test").await.unwrap(), 0x1234_5678);
    }

    #[tokio::test]
    async fn big_endian_u64() {
        let mut mock = Builder::new().read(&[0, 0, 0, 0, 0, 0, 1, 2]).build();
        assert_eq!(read_u64(&mut mock, "test").await.unwrap(), 258);
    }

    #[tokio::test]
    async fn closed_mid_field() {
        let mut mock = Builder::new().read(&[1, 2]).build();
        let mut buf = [0u8; 4];
        let err = read_field(&mut mock, &mut buf, "session id")
            .await
            .unwrap_err();
        assert!(
            matches!(
                err,
                Error::ConnectionClosed {
                    field: "session id",
                    expected: 4
                }
            ),
            "{err:?}"
        );
    }

    #[tokio::test]
    async fn vec_in_pieces() {
        let mut mock = Builder::new().read(b"hel").read(b"lo").build();
        let v = read_vec(&mut mock, 5, "payload").await.unwrap();
        assert_eq!(v, b"hello");
    }

    #[tokio::test]
    async fn vec_short() {
        let mut mock = Builder::new().read(b"hel").build();
        let err = read_vec(&mut mock, 5, "payload").await.unwrap_err();
        assert!(err.is_transport());
    }
}
