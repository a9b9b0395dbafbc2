use std::path::PathBuf;

use futures::future::join_all;

use crate::client::TransferClient;
use crate::format::{is_image, is_mobile_user_agent};
use crate::model::RemoteFile;
use crate::platform::{Platform, SharedFile};

#[derive(Debug, Default)]
pub struct DirectReport {
    pub saved: Vec<PathBuf>,
    pub failed: Vec<String>,
}

/// Saves each file straight from its URL. On mobile user agents images are
/// fetched a second time and saved from memory, which some devices need to
/// put them in the photo library.
pub async fn download_direct<P: Platform>(
    client: &TransferClient,
    platform: &P,
    files: &[&RemoteFile],
) -> DirectReport {
    let mobile = is_mobile_user_agent(&platform.user_agent());
    let mut report = DirectReport::default();

    for file in files {
        match platform.save_url(client, &file.name, &file.url).await {
            Ok(path) => report.saved.push(path),
            Err(e) => {
                tracing::warn!(file = %file.name, error = %e, "Download failed");
                report.failed.push(file.name.clone());
                continue;
            }
        }

        if mobile && is_image(&file.mime_type) {
            let saved = match client.fetch_bytes(&file.url).await {
                Ok(bytes) => platform.save_bytes(&file.name, &bytes),
                Err(e) => Err(e),
            };
            if let Err(e) = saved {
                tracing::warn!(file = %file.name, error = %e, "Saving image for mobile failed");
            }
        }
    }

    report
}

/// Sends the images among `files` to the platform share sheet. Returns how
/// many images were shared; every failure is only logged.
pub async fn share_images<P: Platform>(
    client: &TransferClient,
    platform: &P,
    files: &[RemoteFile],
) -> usize {
    let images: Vec<_> = files.iter().filter(|f| is_image(&f.mime_type)).collect();

    if images.is_empty() {
        tracing::warn!("No images to share");
        return 0;
    }
    if !platform.can_share() {
        tracing::warn!("Sharing is not supported here");
        return 0;
    }

    let fetched = join_all(images.iter().map(|file| async move {
        match client.fetch_bytes(&file.url).await {
            Ok(bytes) => Some(SharedFile {
                name: file.name.clone(),
                mime_type: file.mime_type.clone(),
                bytes,
            }),
            Err(e) => {
                tracing::warn!(file = %file.name, error = %e, "Skipping image, failed to fetch");
                None
            }
        }
    }))
    .await;
    let shared: Vec<_> = fetched.into_iter().flatten().collect();

    if shared.is_empty() {
        tracing::warn!("No images to share");
        return 0;
    }

    let count = shared.len();
    match platform.share(shared) {
        Ok(()) => {
            tracing::info!(count, "Images shared");
            count
        }
        Err(e) => {
            tracing::error!(error = %e, "Error sharing images");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::testing::RecordingPlatform;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)";

    async fn setup() -> (MockServer, TransferClient, Vec<RemoteFile>) {
        let server = MockServer::start().await;
        for (name, status) in [("cat.jpg", 200), ("notes.txt", 200), ("dog.png", 404)] {
            Mock::given(method("GET"))
                .and(path(format!("/raw/{}", name)))
                .respond_with(ResponseTemplate::new(status).set_body_bytes(name.as_bytes()))
                .mount(&server)
                .await;
        }

        let base = Url::parse(&server.uri()).unwrap();
        let client =
            TransferClient::new(base.join("upload").unwrap(), base.join("files").unwrap()).unwrap();
        let files = ["cat.jpg", "notes.txt", "dog.png"]
            .iter()
            .enumerate()
            .map(|(i, name)| RemoteFile {
                id: i.to_string(),
                name: name.to_string(),
                mime_type: crate::format::guess_mime(name).to_string(),
                url: format!("/raw/{}", name),
            })
            .collect();
        (server, client, files)
    }

    #[tokio::test]
    async fn test_direct_download_desktop() {
        let (_server, client, files) = setup().await;
        let refs: Vec<_> = files.iter().collect();
        let platform = RecordingPlatform {
            user_agent: "threef/test".to_string(),
            ..Default::default()
        };

        let report = download_direct(&client, &platform, &refs).await;

        assert_eq!(report.saved.len(), 2);
        assert_eq!(report.failed, vec!["dog.png"]);
        assert_eq!(platform.saved_names(), vec!["cat.jpg", "notes.txt"]);
    }

    #[tokio::test]
    async fn test_direct_download_mobile_saves_images_twice() {
        let (_server, client, files) = setup().await;
        let refs: Vec<_> = files.iter().collect();
        let platform = RecordingPlatform {
            user_agent: IPHONE.to_string(),
            ..Default::default()
        };

        download_direct(&client, &platform, &refs).await;

        assert_eq!(
            platform.saved_names(),
            vec!["cat.jpg", "cat.jpg", "notes.txt"]
        );
    }

    #[tokio::test]
    async fn test_share_images_only_shares_fetched_images() {
        let (_server, client, files) = setup().await;
        let platform = RecordingPlatform {
            user_agent: IPHONE.to_string(),
            shareable: true,
            ..Default::default()
        };

        assert_eq!(share_images(&client, &platform, &files).await, 1);

        let shared = platform.shared.lock().unwrap();
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].name, "cat.jpg");
        assert_eq!(&shared[0].bytes[..], b"cat.jpg");
    }

    #[tokio::test]
    async fn test_share_unsupported_is_silent() {
        let (_server, client, files) = setup().await;
        let platform = RecordingPlatform::default();

        assert_eq!(share_images(&client, &platform, &files).await, 0);
        assert!(platform.shared.lock().unwrap().is_empty());
    }
}
