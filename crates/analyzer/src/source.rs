//! 라인 소스 -- 비동기 리더에서 완성된 라인을 하나씩 꺼냅니다.
//!
//! [`LineReader`]는 원시 바이트를 `\n` 단위로 읽고 UTF-8이 아닌 바이트는
//! 손실 변환합니다. 줄바꿈이 아직 도착하지 않은 꼬리 데이터는 내부 버퍼에
//! 보관했다가 다음 읽기에서 이어 붙입니다.
//!
//! [`FileSource`]는 파일을 처음(배치) 또는 끝(모니터)에서 열고,
//! 파일 크기가 줄어드는 것을 감지합니다.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncSeekExt, BufReader};

use crate::error::AnalyzerError;

/// 줄바꿈 단위 라인 리더
#[derive(Debug)]
pub struct LineReader<R> {
    reader: R,
    pending: Vec<u8>,
    consumed: u64,
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    /// 새 리더를 만듭니다.
    pub fn new(reader: R) -> Self {
        Self::with_offset(reader, 0)
    }

    /// 이미 `offset` 바이트를 지난 리더를 감쌉니다.
    pub fn with_offset(reader: R, offset: u64) -> Self {
        Self {
            reader,
            pending: Vec::new(),
            consumed: offset,
        }
    }

    /// 완성된 다음 라인을 읽습니다.
    ///
    /// 줄바꿈으로 끝나는 라인이 없으면 `None`을 반환하며,
    /// 그때까지 읽은 꼬리 데이터는 버퍼에 남습니다.
    pub async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        let read = self.reader.read_until(b'\n', &mut self.pending).await?;
        self.consumed += read as u64;

        if self.pending.last() != Some(&b'\n') {
            return Ok(None);
        }

        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Ok(Some(line))
    }

    /// 줄바꿈 없이 남은 꼬리 데이터를 꺼냅니다.
    ///
    /// 배치 모드에서 입력 끝의 마지막 라인을 처리할 때 사용합니다.
    pub fn take_remainder(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Some(line)
    }

    /// 아직 줄바꿈을 기다리는 바이트 수
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// 지금까지 읽은 위치 (바이트 오프셋)
    pub fn position(&self) -> u64 {
        self.consumed
    }
}

/// 파일 기반 라인 소스
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    lines: LineReader<BufReader<File>>,
}

impl FileSource {
    /// 파일을 처음부터 읽도록 엽니다.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, AnalyzerError> {
        let path = path.as_ref();
        let file = File::open(path)
            .await
            .map_err(|e| AnalyzerError::source_unavailable(path, &e))?;
        Ok(Self {
            path: path.to_path_buf(),
            lines: LineReader::new(BufReader::new(file)),
        })
    }

    /// 파일 끝에 위치한 상태로 엽니다 (기존 내용은 읽지 않음).
    pub async fn open_at_end(path: impl AsRef<Path>) -> Result<Self, AnalyzerError> {
        let path = path.as_ref();
        let mut file = File::open(path)
            .await
            .map_err(|e| AnalyzerError::source_unavailable(path, &e))?;
        let offset = file
            .seek(SeekFrom::End(0))
            .await
            .map_err(|e| AnalyzerError::source_unavailable(path, &e))?;

        tracing::debug!(path = %path.display(), offset, "opened source at end");
        Ok(Self {
            path: path.to_path_buf(),
            lines: LineReader::with_offset(BufReader::new(file), offset),
        })
    }

    /// 완성된 다음 라인을 읽습니다.
    pub async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        self.lines.next_line().await
    }

    /// 줄바꿈을 기다리며 버퍼에 남아 있는 바이트 수
    pub fn pending_len(&self) -> usize {
        self.lines.pending_len()
    }

    /// 현재 파일 크기가 읽은 위치보다 작은지 확인합니다 (잘림/로테이션 징후).
    pub async fn is_truncated(&self) -> std::io::Result<bool> {
        let len = self.lines.reader.get_ref().metadata().await?.len();
        Ok(len < self.lines.position())
    }

    pub(crate) fn lines_mut(&mut self) -> &mut LineReader<BufReader<File>> {
        &mut self.lines
    }

    /// 소스 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 지금까지 읽은 위치 (바이트 오프셋)
    pub fn position(&self) -> u64 {
        self.lines.position()
    }
}
