//! ffmpeg-backed frame source and encoder.

use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use tiny_skia::Pixmap;

use reframe_common::error::{ReframeError, ReframeResult};
use reframe_project_model::{ExportConfig, ExportFormat};

use crate::assets::pixmap_from_rgba;
use crate::source::{FrameSink, FrameSource};

/// Basic stream facts reported by ffprobe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub duration_secs: f64,
}

/// Whether `binary` resolves on `PATH`.
pub fn command_exists(binary: &str) -> bool {
    Command::new("sh")
        .arg("-c")
        .arg(format!("command -v {binary} >/dev/null 2>&1"))
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Probe the first video stream of `path`.
pub fn probe_video(path: &Path) -> ReframeResult<VideoInfo> {
    if !path.exists() {
        return Err(ReframeError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height:format=duration",
            "-of",
            "default=noprint_wrappers=1",
        ])
        .arg(path)
        .output()
        .map_err(|e| ReframeError::render(format!("Failed to run ffprobe: {e}")))?;

    if !output.status.success() {
        return Err(ReframeError::render(format!(
            "ffprobe failed on {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    parse_probe_output(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
        ReframeError::render(format!(
            "ffprobe reported no usable video stream in {}",
            path.display()
        ))
    })
}

fn parse_probe_output(raw: &str) -> Option<VideoInfo> {
    let mut width = None;
    let mut height = None;
    let mut duration = None;
    for line in raw.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        match key {
            "width" => width = value.parse::<u32>().ok(),
            "height" => height = value.parse::<u32>().ok(),
            "duration" => duration = value.parse::<f64>().ok(),
            _ => {}
        }
    }

    let (width, height) = (width?, height?);
    if width == 0 || height == 0 {
        return None;
    }
    Some(VideoInfo {
        width,
        height,
        duration_secs: duration.filter(|d| d.is_finite() && *d > 0.0).unwrap_or(0.0),
    })
}

/// A [`FrameSource`] that decodes one frame per seek with an ffmpeg call.
///
/// Seeking past the end of the stream keeps presenting the last decoded
/// frame, so a webcam shorter than the screen recording freezes rather
/// than failing the export.
#[derive(Debug)]
pub struct FfmpegFrameSource {
    path: PathBuf,
    info: VideoInfo,
    position: f64,
    frame: Option<Pixmap>,
}

impl FfmpegFrameSource {
    /// Probe `path` and prepare to decode from it.
    pub fn open(path: impl Into<PathBuf>) -> ReframeResult<Self> {
        let path = path.into();
        let info = probe_video(&path)?;
        tracing::debug!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            duration_secs = info.duration_secs,
            "Opened video source"
        );
        Ok(Self {
            path,
            info,
            position: f64::NAN,
            frame: None,
        })
    }

    pub fn info(&self) -> VideoInfo {
        self.info
    }

    fn decode_at(&self, time_secs: f64) -> ReframeResult<Pixmap> {
        let output = Command::new("ffmpeg")
            .args(["-v", "error", "-ss", &format!("{time_secs:.3}"), "-i"])
            .arg(&self.path)
            .args(["-frames:v", "1", "-f", "rawvideo", "-pix_fmt", "rgba", "-"])
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ReframeError::render(format!("Failed to run ffmpeg: {e}")))?;

        if !output.status.success() {
            return Err(ReframeError::render(format!(
                "ffmpeg decode failed (status {}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        if output.stdout.is_empty() {
            return Err(ReframeError::render(format!(
                "No frame decoded at {time_secs:.3}s"
            )));
        }
        pixmap_from_rgba(self.info.width, self.info.height, output.stdout)
    }
}

impl FrameSource for FfmpegFrameSource {
    fn duration_secs(&self) -> f64 {
        self.info.duration_secs
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.info.width, self.info.height)
    }

    fn current_time(&self) -> f64 {
        if self.position.is_nan() {
            0.0
        } else {
            self.position
        }
    }

    fn seek(&mut self, time_secs: f64) -> ReframeResult<()> {
        let time_secs = time_secs.max(0.0);
        if self.frame.is_some() && time_secs == self.position {
            return Ok(());
        }
        let past_end = self.info.duration_secs > 0.0 && time_secs >= self.info.duration_secs;
        if past_end && self.frame.is_some() {
            self.position = time_secs;
            return Ok(());
        }

        match self.decode_at(time_secs) {
            Ok(frame) => {
                self.frame = Some(frame);
                self.position = time_secs;
                Ok(())
            }
            Err(err) if self.frame.is_some() && (past_end || is_empty_decode(&err)) => {
                tracing::debug!(time_secs, error = %err, "Holding last frame");
                self.position = time_secs;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn frame(&self) -> ReframeResult<&Pixmap> {
        self.frame.as_ref().ok_or_else(|| {
            ReframeError::render(format!("No frame decoded yet from {}", self.path.display()))
        })
    }
}

fn is_empty_decode(err: &ReframeError) -> bool {
    matches!(err, ReframeError::Render { message } if message.starts_with("No frame decoded"))
}

/// Codec arguments for an export format.
pub fn codec_args_for_config(config: &ExportConfig) -> Vec<String> {
    let video_bitrate = format!("{}k", config.video_bitrate_kbps.max(1000));

    match config.format {
        ExportFormat::Mp4H264 => vec![
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            "medium".to_string(),
            "-profile:v".to_string(),
            "high".to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-b:v".to_string(),
            video_bitrate,
            "-movflags".to_string(),
            "+faststart".to_string(),
        ],
        ExportFormat::Mp4H265 => vec![
            "-c:v".to_string(),
            "libx265".to_string(),
            "-preset".to_string(),
            "medium".to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-b:v".to_string(),
            video_bitrate,
            "-tag:v".to_string(),
            "hvc1".to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
        ],
        ExportFormat::Gif => vec![
            "-vf".to_string(),
            "fps=15,split[s0][s1];[s0]palettegen[p];[s1][p]paletteuse".to_string(),
            "-loop".to_string(),
            "0".to_string(),
        ],
        ExportFormat::Webm => vec![
            "-c:v".to_string(),
            "libvpx-vp9".to_string(),
            "-b:v".to_string(),
            video_bitrate,
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
        ],
    }
}

/// Full ffmpeg argument list for encoding raw RGBA frames from stdin.
pub fn encoder_args(config: &ExportConfig, output_path: &Path) -> Vec<String> {
    let mut args = vec![
        "-y".to_string(),
        "-v".to_string(),
        "error".to_string(),
        "-f".to_string(),
        "rawvideo".to_string(),
        "-pix_fmt".to_string(),
        "rgba".to_string(),
        "-s".to_string(),
        format!("{}x{}", config.width, config.height),
        "-r".to_string(),
        config.fps.max(1).to_string(),
        "-i".to_string(),
        "-".to_string(),
    ];
    args.extend(codec_args_for_config(config));
    args.push(output_path.display().to_string());
    args
}

/// A [`FrameSink`] that pipes raw RGBA frames into an ffmpeg process.
pub struct FfmpegEncoder {
    child: Child,
    stdin: Option<ChildStdin>,
    stderr_task: Option<JoinHandle<String>>,
    output_path: PathBuf,
    frame_len: usize,
    frames_written: u64,
    finished: bool,
}

impl FfmpegEncoder {
    /// Start ffmpeg writing to `output_path`.
    pub fn spawn(config: &ExportConfig, output_path: &Path) -> ReframeResult<Self> {
        if !command_exists("ffmpeg") {
            return Err(ReframeError::unsupported(
                "No supported encoder found (expected ffmpeg in PATH)",
            ));
        }
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let args = encoder_args(config, output_path);
        tracing::debug!(args = ?args, "Running ffmpeg");
        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ReframeError::export("encoding", format!("Failed to start ffmpeg: {e}")))?;

        tracing::info!(
            pid = child.id(),
            output = %output_path.display(),
            format = ?config.format,
            "ffmpeg process started"
        );

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ReframeError::export("encoding", "Failed to capture ffmpeg stdin"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReframeError::export("encoding", "Failed to capture ffmpeg stderr"))?;

        // Drain stderr concurrently so ffmpeg never blocks on a full pipe.
        let stderr_task = std::thread::spawn(move || -> String {
            let mut reader = BufReader::new(stderr);
            let mut output = String::new();
            match reader.read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        Ok(Self {
            child,
            stdin: Some(stdin),
            stderr_task: Some(stderr_task),
            output_path: output_path.to_path_buf(),
            frame_len: config.width as usize * config.height as usize * 4,
            frames_written: 0,
            finished: false,
        })
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    fn collect_stderr(&mut self) -> String {
        self.stderr_task
            .take()
            .map(|task| {
                task.join()
                    .unwrap_or_else(|_| "<failed to join stderr reader>".to_string())
            })
            .unwrap_or_default()
    }

    fn remove_output(&self) {
        if self.output_path.exists() {
            if let Err(err) = std::fs::remove_file(&self.output_path) {
                tracing::warn!(
                    error = %err,
                    path = %self.output_path.display(),
                    "Failed to remove partial output"
                );
            }
        }
    }
}

impl FrameSink for FfmpegEncoder {
    fn write_frame(&mut self, rgba: &[u8]) -> ReframeResult<()> {
        if rgba.len() != self.frame_len {
            return Err(ReframeError::export(
                "encoding",
                format!("frame is {} bytes, expected {}", rgba.len(), self.frame_len),
            ));
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| ReframeError::export("encoding", "ffmpeg input already closed"))?;
        stdin.write_all(rgba).map_err(|e| {
            ReframeError::export("encoding", format!("Failed writing to ffmpeg: {e}"))
        })?;
        self.frames_written += 1;
        Ok(())
    }

    fn fatal_error(&mut self) -> Option<String> {
        match self.child.try_wait() {
            Ok(Some(status)) => Some(format!(
                "ffmpeg exited early ({status}) after {} frames",
                self.frames_written
            )),
            Ok(None) => None,
            Err(err) => Some(format!("Failed to poll ffmpeg: {err}")),
        }
    }

    fn finish(&mut self) -> ReframeResult<()> {
        // Closing stdin signals end of stream.
        drop(self.stdin.take());
        let status = self
            .child
            .wait()
            .map_err(|e| ReframeError::export("finalizing", format!("Failed to wait on ffmpeg: {e}")))?;
        self.finished = true;
        let stderr_output = self.collect_stderr();

        if !status.success() {
            self.remove_output();
            return Err(ReframeError::export(
                "finalizing",
                format!("ffmpeg export failed (status {status}): {}", stderr_output.trim()),
            ));
        }
        if !stderr_output.trim().is_empty() {
            tracing::warn!(stderr = %stderr_output.trim(), "ffmpeg reported warnings");
        }
        tracing::info!(
            frames = self.frames_written,
            output = %self.output_path.display(),
            "Encoder finished"
        );
        Ok(())
    }

    fn abort(&mut self) {
        drop(self.stdin.take());
        if !self.finished {
            if let Err(err) = self.child.kill() {
                tracing::debug!(error = %err, "ffmpeg already stopped");
            }
            let _ = self.child.wait();
            self.finished = true;
        }
        let stderr_output = self.collect_stderr();
        if !stderr_output.trim().is_empty() {
            tracing::debug!(stderr = %stderr_output.trim(), "ffmpeg stderr at abort");
        }
        self.remove_output();
        tracing::info!(
            frames = self.frames_written,
            output = %self.output_path.display(),
            "Encoder aborted, partial output removed"
        );
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(format: ExportFormat) -> ExportConfig {
        ExportConfig {
            format,
            width: 1280,
            height: 720,
            fps: 30,
            video_bitrate_kbps: 8000,
        }
    }

    #[test]
    fn test_parse_probe_output() {
        let info = parse_probe_output("width=1920\nheight=1080\nduration=12.500000\n").unwrap();
        assert_eq!(
            info,
            VideoInfo {
                width: 1920,
                height: 1080,
                duration_secs: 12.5
            }
        );
    }

    #[test]
    fn test_parse_probe_output_tolerates_missing_duration() {
        let info = parse_probe_output("width=640\nheight=480\nduration=N/A\n").unwrap();
        assert_eq!(info.duration_secs, 0.0);
        assert!(parse_probe_output("width=0\nheight=480\n").is_none());
        assert!(parse_probe_output("").is_none());
    }

    #[test]
    fn test_encoder_args_read_raw_rgba_from_stdin() {
        let args = encoder_args(&config(ExportFormat::Mp4H264), Path::new("/tmp/out.mp4"));
        let joined = args.join(" ");
        assert!(joined.contains("-f rawvideo -pix_fmt rgba -s 1280x720 -r 30 -i -"));
        assert!(joined.contains("libx264"));
        assert!(joined.contains("-b:v 8000k"));
        assert_eq!(args.last().map(String::as_str), Some("/tmp/out.mp4"));
    }

    #[test]
    fn test_codec_args_per_format() {
        assert!(codec_args_for_config(&config(ExportFormat::Mp4H265)).contains(&"libx265".to_string()));
        assert!(codec_args_for_config(&config(ExportFormat::Webm)).contains(&"libvpx-vp9".to_string()));
        let gif = codec_args_for_config(&config(ExportFormat::Gif)).join(" ");
        assert!(gif.contains("palettegen") && gif.contains("paletteuse"));
    }

    #[test]
    fn test_bitrate_has_a_floor() {
        let mut low = config(ExportFormat::Mp4H264);
        low.video_bitrate_kbps = 0;
        assert!(codec_args_for_config(&low).contains(&"1000k".to_string()));
    }

    #[test]
    fn test_command_exists_for_shell() {
        assert!(command_exists("sh"));
        assert!(!command_exists("reframe-definitely-not-a-binary"));
    }
}
