//! Byte pumps between the local terminal and a remote stream

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const BUFFER_SIZE: usize = 4096;

/// Which side of a pump failed.
#[derive(Debug)]
pub enum PumpError {
    Read(io::Error),
    Write(io::Error),
}

/// Copy `reader` into `writer` until the reader ends, flushing after every
/// read so interactive output shows up immediately. Returns bytes copied.
pub async fn pump<R, W>(reader: &mut R, writer: &mut W) -> Result<u64, PumpError>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = [0u8; BUFFER_SIZE];
    let mut copied = 0u64;
    loop {
        let n = reader.read(&mut buf).await.map_err(PumpError::Read)?;
        if n == 0 {
            return Ok(copied);
        }
        writer.write_all(&buf[..n]).await.map_err(PumpError::Write)?;
        writer.flush().await.map_err(PumpError::Write)?;
        copied += n as u64;
    }
}
