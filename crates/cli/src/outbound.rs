//! Matrix-backed implementation of the dispatcher's outbound seam.

use {
    anyhow::Result,
    async_trait::async_trait,
    matrix_sdk::{room::Room, ruma::events::room::message::RoomMessageEventContent},
};

use regbot_commands::Outbound;

/// Sends dispatcher replies into the room the command came from.
pub struct RoomOutbound {
    room: Room,
}

impl RoomOutbound {
    pub fn new(room: Room) -> Self {
        Self { room }
    }
}

#[async_trait]
impl Outbound for RoomOutbound {
    async fn send_text(&self, text: &str) -> Result<()> {
        self.room
            .send(RoomMessageEventContent::text_plain(text))
            .await?;
        Ok(())
    }

    async fn send_markdown(&self, markdown: &str) -> Result<()> {
        self.room
            .send(RoomMessageEventContent::text_markdown(markdown))
            .await?;
        Ok(())
    }
}
