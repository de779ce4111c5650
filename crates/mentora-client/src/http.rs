use reqwest::Client;
use tracing::warn;

use mentora_types::ChatError;
use mentora_types::api::{
    MediaItemDto, MessageDto, RoomDto, SendMessagePayload, SignedUrlDto, UploadedFile,
};
use mentora_types::models::MediaKind;

use crate::{Backend, ClientConfig, FilePayload};

/// HTTP implementation of [`Backend`] against the platform's chat API.
///
/// Read failures map to `FetchFailed`, writes to `SendFailed`/`UploadFailed`
/// and signed-URL issuance to `SignedUrlFailed`; the components translate
/// those into retained state rather than letting them escape to the UI.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, &str)],
    ) -> Result<T, String> {
        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(format!("{} ({})", body, status));
        }
        resp.json::<T>().await.map_err(|e| e.to_string())
    }
}

impl Backend for HttpBackend {
    async fn rooms(&self, actor_id: &str) -> Result<Vec<RoomDto>, ChatError> {
        self.get_json(self.url("/api/chat/rooms"), &[("actorId", actor_id)])
            .await
            .map_err(|reason| {
                warn!(actor_id, %reason, "room list fetch failed");
                ChatError::FetchFailed { reason }
            })
    }

    async fn messages(&self, room_id: &str) -> Result<Vec<MessageDto>, ChatError> {
        self.get_json(
            self.url(&format!("/api/chat/rooms/{room_id}/messages")),
            &[],
        )
        .await
        .map_err(|reason| {
            warn!(room_id, %reason, "message history fetch failed");
            ChatError::FetchFailed { reason }
        })
    }

    async fn post_message(
        &self,
        room_id: &str,
        actor_id: &str,
        payload: SendMessagePayload,
    ) -> Result<MessageDto, ChatError> {
        let send = async {
            let resp = self
                .client
                .post(self.url(&format!("/api/chat/rooms/{room_id}/messages")))
                .query(&[("actorId", actor_id)])
                .json(&payload)
                .send()
                .await
                .map_err(|e| e.to_string())?;
            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                return Err(format!("{} ({})", body, status));
            }
            resp.json::<MessageDto>().await.map_err(|e| e.to_string())
        };
        send.await.map_err(|reason| {
            warn!(room_id, %reason, "message write failed");
            ChatError::SendFailed { reason }
        })
    }

    async fn upload(
        &self,
        file: FilePayload,
        actor_id: &str,
        category: &str,
    ) -> Result<UploadedFile, ChatError> {
        let part = reqwest::multipart::Part::bytes(file.bytes)
            .file_name(file.name.clone())
            .mime_str(&file.mime)
            .map_err(|e| ChatError::UploadFailed {
                reason: e.to_string(),
            })?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("actorId", actor_id.to_string())
            .text("category", category.to_string());

        let send = async {
            let resp = self
                .client
                .post(self.url("/api/chat/upload"))
                .multipart(form)
                .send()
                .await
                .map_err(|e| e.to_string())?;
            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                return Err(format!("{} ({})", body, status));
            }
            resp.json::<UploadedFile>().await.map_err(|e| e.to_string())
        };
        send.await.map_err(|reason| {
            warn!(name = %file.name, %reason, "upload failed");
            ChatError::UploadFailed { reason }
        })
    }

    async fn signed_url(&self, raw: &str) -> Result<SignedUrlDto, ChatError> {
        self.get_json(self.url("/api/storage/signed-url"), &[("path", raw)])
            .await
            .map_err(|reason| {
                warn!(path = raw, %reason, "signed url issuance failed");
                ChatError::SignedUrlFailed { reason }
            })
    }

    async fn media(&self, room_id: &str, kind: MediaKind) -> Result<Vec<MediaItemDto>, ChatError> {
        let kind_str = match kind {
            MediaKind::Images => "images",
            MediaKind::Files => "files",
            MediaKind::Links => "links",
        };
        self.get_json(
            self.url(&format!("/api/chat/rooms/{room_id}/media")),
            &[("type", kind_str)],
        )
        .await
        .map_err(|reason| {
            warn!(room_id, kind = kind_str, %reason, "media fetch failed");
            ChatError::FetchFailed { reason }
        })
    }
}
