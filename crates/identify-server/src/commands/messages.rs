/*!
 * Sealing commands
 *
 * Without `--from`, messages are sealed anonymously. With `--from`, the sender unlocks
 * their identity and the recipient opens with the same `--from` to check who sent it.
 */

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use identify_identity::{IdentityStore, PrivateIdentity, PublicIdentity};

use super::unlock;
use crate::state::AppState;

/// Seal `message` to `recipient` and print it as base64.
pub async fn seal(
    state: &AppState,
    recipient: &str,
    from: Option<&str>,
    message: &str,
) -> Result<()> {
    let recipient = state.identities.get_identity(recipient).await?;
    let sender = match from {
        Some(sender) => Some(unlock(state, sender).await?),
        None => None,
    };

    println!("{}", seal_text(&recipient, sender.as_ref(), message)?);
    Ok(())
}

/// Open a base64 message sealed to `id`, by `from` if given.
pub async fn open(state: &AppState, id: &str, from: Option<&str>, sealed: &str) -> Result<()> {
    let sender = match from {
        Some(sender) => Some(state.identities.get_identity(sender).await?),
        None => None,
    };
    let recipient = unlock(state, id).await?;

    println!("{}", open_text(&recipient, sender.as_ref(), sealed)?);
    Ok(())
}

fn seal_text(
    recipient: &PublicIdentity,
    sender: Option<&PrivateIdentity>,
    message: &str,
) -> Result<String> {
    let sealed = match sender {
        Some(sender) => sender.seal_message(recipient, message.as_bytes())?,
        None => recipient.seal_anonymous(message.as_bytes())?,
    };
    Ok(STANDARD.encode(sealed))
}

fn open_text(
    recipient: &PrivateIdentity,
    sender: Option<&PublicIdentity>,
    sealed: &str,
) -> Result<String> {
    let sealed = STANDARD
        .decode(sealed.trim())
        .context("Sealed message is not base64")?;

    let message = match sender {
        Some(sender) => recipient
            .open_message(sender, &sealed)
            .context("Message was not sealed by that sender to this identity")?,
        None => recipient
            .open_anonymous(&sealed)
            .context("Message was not sealed to this identity")?,
    };

    Ok(String::from_utf8_lossy(&message).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_sealed_message_opens_only_with_that_sender() {
        let (_, alice) = PublicIdentity::create("a").unwrap();
        let (bob_public, bob) = PublicIdentity::create("b").unwrap();
        let (carol_public, _) = PublicIdentity::create("c").unwrap();

        let sealed = seal_text(&bob_public, Some(&alice), "hi bob").unwrap();

        assert_eq!(
            open_text(&bob, Some(alice.public()), &sealed).unwrap(),
            "hi bob"
        );
        assert!(open_text(&bob, Some(&carol_public), &sealed).is_err());
        assert!(open_text(&bob, None, &sealed).is_err());
    }

    #[test]
    fn test_anonymous_message_round_trip() {
        let (bob_public, bob) = PublicIdentity::create("b").unwrap();
        let (_, carol) = PublicIdentity::create("c").unwrap();

        let sealed = seal_text(&bob_public, None, "anyone can send this").unwrap();

        assert_eq!(open_text(&bob, None, &sealed).unwrap(), "anyone can send this");
        assert!(open_text(&carol, None, &sealed).is_err());
        assert!(open_text(&bob, None, "%%%").is_err());
    }
}
