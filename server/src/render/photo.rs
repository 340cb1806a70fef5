use std::io::Cursor;
use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::ImageReader;
use reqwest::redirect::Policy;
use reqwest::Url;
use thiserror::Error;
use tiny_skia::{ColorU8, Pixmap};
use tracing::warn;

/// Largest encoded photo accepted from a data URI or a remote host.
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;
/// Largest decoded photo, in pixels.
pub const MAX_PHOTO_PIXELS: u64 = 16_000_000;

#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("unsupported photo reference '{0}'")]
    UnsupportedSource(String),

    #[error("malformed data URI: {0}")]
    MalformedDataUri(String),

    #[error("photo host '{0}' is not publicly routable")]
    BlockedHost(String),

    #[error("photo is too large: {0}")]
    TooLarge(String),

    #[error("photo fetch failed: {0}")]
    Fetch(String),

    #[error("photo could not be decoded: {0}")]
    Decode(String),
}

/// Resolves an attendee photo reference into decoded pixels.
#[async_trait]
pub trait PhotoLoader: Send + Sync {
    async fn load(&self, url: &str) -> Result<Pixmap, PhotoError>;
}

/// Loads `data:` URIs inline and `http(s)` URLs over the network.
///
/// Remote hosts must resolve to public addresses unless
/// [`HttpPhotoLoader::allow_private_hosts`] is set. Redirects are not followed.
#[derive(Clone)]
pub struct HttpPhotoLoader {
    client: reqwest::Client,
    allow_private_hosts: bool,
}

impl HttpPhotoLoader {
    pub fn new(timeout: Duration) -> Result<Self, PhotoError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .build()
            .map_err(|e| PhotoError::Fetch(e.to_string()))?;
        Ok(Self {
            client,
            allow_private_hosts: false,
        })
    }

    pub fn allow_private_hosts(mut self, allow: bool) -> Self {
        self.allow_private_hosts = allow;
        self
    }

    async fn check_host(&self, url: &Url) -> Result<(), PhotoError> {
        if self.allow_private_hosts {
            return Ok(());
        }
        let host = url
            .host_str()
            .ok_or_else(|| PhotoError::UnsupportedSource(url.to_string()))?;
        let bare = host.trim_start_matches('[').trim_end_matches(']');

        let addrs: Vec<IpAddr> = match bare.parse::<IpAddr>() {
            Ok(ip) => vec![ip],
            Err(_) => {
                let port = url.port_or_known_default().unwrap_or(80);
                tokio::net::lookup_host((bare, port))
                    .await
                    .map_err(|e| PhotoError::Fetch(format!("cannot resolve {host}: {e}")))?
                    .map(|addr| addr.ip())
                    .collect()
            }
        };

        if addrs.is_empty() || !addrs.into_iter().all(is_public) {
            warn!(host, "refusing to fetch photo from a non-public host");
            return Err(PhotoError::BlockedHost(host.to_string()));
        }
        Ok(())
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, PhotoError> {
        let url = Url::parse(url).map_err(|e| PhotoError::UnsupportedSource(e.to_string()))?;
        self.check_host(&url).await?;

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| PhotoError::Fetch(e.to_string()))?;
        if response.status().is_redirection() {
            return Err(PhotoError::Fetch(format!(
                "redirect ({}) not followed",
                response.status()
            )));
        }
        if let Some(len) = response.content_length() {
            if len > MAX_PHOTO_BYTES as u64 {
                return Err(PhotoError::TooLarge(format!("{len} bytes")));
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| PhotoError::Fetch(e.to_string()))?
        {
            if body.len() + chunk.len() > MAX_PHOTO_BYTES {
                return Err(PhotoError::TooLarge(format!(
                    "more than {MAX_PHOTO_BYTES} bytes"
                )));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}

#[async_trait]
impl PhotoLoader for HttpPhotoLoader {
    async fn load(&self, url: &str) -> Result<Pixmap, PhotoError> {
        let bytes = if let Some(data) = url.strip_prefix("data:") {
            decode_data_uri(data)?
        } else if url.starts_with("http://") || url.starts_with("https://") {
            self.fetch(url).await?
        } else {
            return Err(PhotoError::UnsupportedSource(url.to_string()));
        };
        decode_image(&bytes)
    }
}

fn is_public(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, ..] = v4.octets();
            let shared = a == 100 && (b & 0xc0) == 64;
            !(v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.is_documentation()
                || shared)
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_public(IpAddr::V4(v4));
            }
            let first = v6.segments()[0];
            let unique_local = (first & 0xfe00) == 0xfc00;
            let link_local = (first & 0xffc0) == 0xfe80;
            !(v6.is_loopback() || v6.is_unspecified() || unique_local || link_local)
        }
    }
}

/// Decodes the part of a data URI after `data:`. Only base64 payloads are
/// accepted, as produced by browser file readers.
pub fn decode_data_uri(data: &str) -> Result<Vec<u8>, PhotoError> {
    let (meta, payload) = data
        .split_once(',')
        .ok_or_else(|| PhotoError::MalformedDataUri("missing ',' separator".to_string()))?;
    if !meta.ends_with(";base64") {
        return Err(PhotoError::MalformedDataUri(
            "only base64 payloads are supported".to_string(),
        ));
    }
    let payload = payload.trim();
    if payload.len() > MAX_PHOTO_BYTES.div_ceil(3) * 4 {
        return Err(PhotoError::TooLarge(format!(
            "{} base64 characters",
            payload.len()
        )));
    }
    STANDARD
        .decode(payload)
        .map_err(|e| PhotoError::MalformedDataUri(e.to_string()))
}

/// Decodes a PNG, JPEG or WebP photo into a premultiplied pixmap.
pub fn decode_image(bytes: &[u8]) -> Result<Pixmap, PhotoError> {
    decode_image_within(bytes, MAX_PHOTO_PIXELS)
}

fn decode_image_within(bytes: &[u8], max_pixels: u64) -> Result<Pixmap, PhotoError> {
    let decode_err = |e: image::ImageError| PhotoError::Decode(e.to_string());

    let (width, height) = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PhotoError::Decode(e.to_string()))?
        .into_dimensions()
        .map_err(decode_err)?;
    if u64::from(width) * u64::from(height) > max_pixels {
        return Err(PhotoError::TooLarge(format!("{width}x{height} pixels")));
    }

    let rgba = image::load_from_memory(bytes).map_err(decode_err)?.into_rgba8();
    let mut pixmap = Pixmap::new(rgba.width(), rgba.height())
        .ok_or_else(|| PhotoError::Decode("image has no pixels".to_string()))?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(rgba.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use tiny_skia::Color;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn png_data_uri() -> String {
        let mut pixmap = Pixmap::new(2, 2).unwrap();
        pixmap.fill(Color::from_rgba8(0, 128, 0, 255));
        let png = pixmap.encode_png().unwrap();
        format!("data:image/png;base64,{}", STANDARD.encode(png))
    }

    fn jpeg_bytes() -> Vec<u8> {
        let image = RgbImage::from_pixel(4, 3, Rgb([200, 30, 30]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
            .unwrap();
        bytes
    }

    /// Serves one HTTP response on a loopback port and returns its URL.
    async fn serve_once(head: String, body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(&body).await;
        });
        format!("http://{addr}/photo")
    }

    #[tokio::test]
    async fn test_data_uri_png_is_decoded() {
        let loader = HttpPhotoLoader::new(Duration::from_secs(1)).unwrap();
        let photo = loader.load(&png_data_uri()).await.unwrap();
        assert_eq!((photo.width(), photo.height()), (2, 2));
    }

    #[tokio::test]
    async fn test_data_uri_jpeg_is_decoded() {
        let loader = HttpPhotoLoader::new(Duration::from_secs(1)).unwrap();
        let uri = format!("data:image/jpeg;base64,{}", STANDARD.encode(jpeg_bytes()));
        let photo = loader.load(&uri).await.unwrap();
        assert_eq!((photo.width(), photo.height()), (4, 3));
        let pixel = photo.pixel(1, 1).unwrap();
        assert_eq!(pixel.alpha(), 255);
        assert!(pixel.red() > 150 && pixel.green() < 80);
    }

    #[tokio::test]
    async fn test_unknown_scheme_is_unsupported() {
        let loader = HttpPhotoLoader::new(Duration::from_secs(1)).unwrap();
        assert!(matches!(
            loader.load("ftp://example.com/a.png").await,
            Err(PhotoError::UnsupportedSource(_))
        ));
    }

    #[tokio::test]
    async fn test_private_hosts_are_refused() {
        let loader = HttpPhotoLoader::new(Duration::from_secs(1)).unwrap();
        for url in [
            "http://127.0.0.1/photo.png",
            "http://169.254.169.254/latest/meta-data",
            "http://10.1.2.3/a.png",
            "http://[::1]/a.png",
            "http://localhost/a.png",
        ] {
            assert!(
                matches!(loader.load(url).await, Err(PhotoError::BlockedHost(_))),
                "{url}"
            );
        }
    }

    #[tokio::test]
    async fn test_remote_photo_is_fetched_and_decoded() {
        let body = jpeg_bytes();
        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        let url = serve_once(head, body).await;
        let loader = HttpPhotoLoader::new(Duration::from_secs(5))
            .unwrap()
            .allow_private_hosts(true);
        let photo = loader.load(&url).await.unwrap();
        assert_eq!((photo.width(), photo.height()), (4, 3));
    }

    #[tokio::test]
    async fn test_oversized_remote_photo_is_rejected() {
        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            MAX_PHOTO_BYTES + 1
        );
        let url = serve_once(head, Vec::new()).await;
        let loader = HttpPhotoLoader::new(Duration::from_secs(5))
            .unwrap()
            .allow_private_hosts(true);
        assert!(matches!(
            loader.load(&url).await,
            Err(PhotoError::TooLarge(_))
        ));
    }

    #[test]
    fn test_data_uri_shapes() {
        assert!(matches!(
            decode_data_uri("image/png;base64"),
            Err(PhotoError::MalformedDataUri(_))
        ));
        assert!(matches!(
            decode_data_uri("image/svg+xml,<svg/>"),
            Err(PhotoError::MalformedDataUri(_))
        ));
        assert_eq!(decode_data_uri("image/png;base64,AAEC").unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_oversized_data_uri_is_rejected() {
        let payload = "A".repeat(MAX_PHOTO_BYTES / 3 * 4 + 8);
        assert!(matches!(
            decode_data_uri(&format!("image/png;base64,{payload}")),
            Err(PhotoError::TooLarge(_))
        ));
    }

    #[test]
    fn test_pixel_limit_is_enforced() {
        let jpeg = jpeg_bytes();
        assert!(decode_image_within(&jpeg, 12).is_ok());
        assert!(matches!(
            decode_image_within(&jpeg, 11),
            Err(PhotoError::TooLarge(_))
        ));
    }

    #[test]
    fn test_garbage_fails_to_decode() {
        assert!(matches!(
            decode_image(b"\xff\xd8\xff\xe0 not really a jpeg"),
            Err(PhotoError::Decode(_))
        ));
        assert!(matches!(
            decode_image(b"plain text"),
            Err(PhotoError::Decode(_))
        ));
    }

    #[test]
    fn test_only_public_addresses_pass() {
        assert!(is_public("93.184.216.34".parse().unwrap()));
        assert!(is_public("2606:4700::1111".parse().unwrap()));
        assert!(!is_public("192.168.1.5".parse().unwrap()));
        assert!(!is_public("100.64.0.1".parse().unwrap()));
        assert!(!is_public("fd00::1".parse().unwrap()));
        assert!(!is_public("::ffff:127.0.0.1".parse().unwrap()));
    }
}
