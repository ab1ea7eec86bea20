//! The boot-time provisioning state machine.
//!
//! Runs once per boot and ends in one of two ways: with the resolved
//! [`OperatingConfig`] for the operating-mode runtime, or with a factory reset after
//! which the caller must restart the device.
//!
//! ```text
//!            boot read (read-only)
//!     ┌──────────────┼──────────────────┐
//!     ▼              ▼                  ▼
//! SchemaStale ─► Unprovisioned   ProvisionedNormal ──(button up)──► Complete
//!                    │                  │ (button down)
//!                    │                  ▼
//!                    │          AwaitingReconfirm ──(held 2 s)──► FactoryResetPending
//!                    ▼                  │ (released)
//!            CapturingCredentials ◄─────┘
//!                    │
//!                    ▼
//!                 Complete
//! ```
//!
//! Neither credential capture nor the reset confirmation has a timeout.

use embedded_hal::digital::InputPin;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::digital::Wait;
use embedded_storage::nor_flash::NorFlash;

use crate::button::{ModeButton, PressDuration};
use crate::config::{self, OperatingConfig, OPERATING_DEFAULTS, keys};
use crate::portal::{self, AccessPoint, ApConfig, PortalTransport};
use crate::store::{Access, Preferences};
use crate::{
    Result, OPERATING_NAMESPACE, OPERATING_SCHEMA_VERSION, PERIPHERAL_NAMESPACE, RECONFIRM_HOLD,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProvisioningState {
    Unprovisioned,
    SchemaStale,
    ProvisionedNormal,
    AwaitingReconfirm,
    FactoryResetPending,
    CapturingCredentials,
    Complete,
}

/// Something the operator should see while provisioning runs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Cue {
    /// No usable configuration; the portal is about to come up.
    ConfigurationRequired,
    /// The button was down at boot; keep holding to reset, release to reconfigure.
    ReconfigurePending,
    CredentialsReceived,
    /// Both namespaces are being erased.
    FactoryReset,
}

/// Shows provisioning cues to the operator.
pub trait Indicator {
    fn show(&mut self, cue: Cue);
}

/// How provisioning ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Hand this to the operating-mode runtime.
    Operating(OperatingConfig),
    /// All settings are gone. Restart the device.
    FactoryReset,
}

/// Result of running one state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    Next(ProvisioningState),
    Done(Outcome),
}

/// Everything the state machine touches, injected by the caller.
pub struct Provisioner<'a, F, P, D, I, A, T>
where
    F: NorFlash,
{
    pub prefs: &'a mut Preferences<F>,
    pub button: &'a mut ModeButton<P>,
    pub delay: &'a mut D,
    pub indicator: &'a mut I,
    pub access_point: &'a mut A,
    pub transport: &'a mut T,
    pub ap_config: &'a ApConfig,
}

impl<F, P, D, I, A, T> Provisioner<'_, F, P, D, I, A, T>
where
    F: NorFlash,
    P: InputPin + Wait,
    D: DelayNs,
    I: Indicator,
    A: AccessPoint,
    T: PortalTransport,
{
    /// Run from the boot read until provisioning ends.
    ///
    /// # Errors
    ///
    /// Store and access-point errors end provisioning early.
    pub async fn run(&mut self) -> Result<Outcome> {
        let mut state = self.boot_state()?;
        loop {
            match self.state_to_state(state).await? {
                Transition::Next(next) => {
                    info!("Provisioning: {:?} -> {:?}", state, next);
                    state = next;
                }
                Transition::Done(outcome) => return Ok(outcome),
            }
        }
    }

    /// Classify the stored configuration without modifying it.
    ///
    /// Missing keys read as `provisioned = false` and schema version 0.
    ///
    /// # Errors
    ///
    /// See [`Preferences::begin`].
    pub fn boot_state(&mut self) -> Result<ProvisioningState> {
        let namespace = self.prefs.begin(OPERATING_NAMESPACE, Access::ReadOnly)?;
        let provisioned = namespace.get_bool(keys::PROVISIONED, false);
        let schema_version = namespace.get_u16(keys::SCHEMA_VERSION, 0);
        Ok(if provisioned && schema_version != OPERATING_SCHEMA_VERSION {
            warn!(
                "Stored schema {} does not match {}",
                schema_version, OPERATING_SCHEMA_VERSION
            );
            ProvisioningState::SchemaStale
        } else if !provisioned {
            ProvisioningState::Unprovisioned
        } else {
            ProvisioningState::ProvisionedNormal
        })
    }

    /// Run one state.
    ///
    /// # Errors
    ///
    /// Store and access-point errors.
    pub async fn state_to_state(&mut self, state: ProvisioningState) -> Result<Transition> {
        let transition = match state {
            ProvisioningState::SchemaStale => Transition::Next(self.schema_stale_state()?),
            ProvisioningState::Unprovisioned => Transition::Next(self.unprovisioned_state()?),
            ProvisioningState::ProvisionedNormal => {
                Transition::Next(self.provisioned_normal_state())
            }
            ProvisioningState::AwaitingReconfirm => {
                Transition::Next(self.awaiting_reconfirm_state().await)
            }
            ProvisioningState::CapturingCredentials => {
                Transition::Next(self.capturing_credentials_state().await?)
            }
            ProvisioningState::FactoryResetPending => {
                Transition::Done(self.factory_reset_pending_state()?)
            }
            ProvisioningState::Complete => Transition::Done(self.complete_state()?),
        };
        Ok(transition)
    }

    // All prior keys are dropped. There is no migration between schema versions.
    fn schema_stale_state(&mut self) -> Result<ProvisioningState> {
        self.prefs.wipe(OPERATING_NAMESPACE)?;
        info!("Operating settings wiped for schema {}", OPERATING_SCHEMA_VERSION);
        Ok(ProvisioningState::Unprovisioned)
    }

    fn unprovisioned_state(&mut self) -> Result<ProvisioningState> {
        // Nothing in an unprovisioned namespace is kept, including keys of older firmware.
        let mut namespace = self.prefs.begin(OPERATING_NAMESPACE, Access::ReadWrite)?;
        namespace.clear()?;
        config::write_defaults(&mut namespace, &OPERATING_DEFAULTS)?;
        namespace.end()?;
        self.indicator.show(Cue::ConfigurationRequired);
        Ok(ProvisioningState::CapturingCredentials)
    }

    fn provisioned_normal_state(&mut self) -> ProvisioningState {
        if self.button.is_pressed() {
            ProvisioningState::AwaitingReconfirm
        } else {
            ProvisioningState::Complete
        }
    }

    async fn awaiting_reconfirm_state(&mut self) -> ProvisioningState {
        self.indicator.show(Cue::ReconfigurePending);
        match self.button.hold_or_release(RECONFIRM_HOLD, self.delay).await {
            PressDuration::Long => ProvisioningState::FactoryResetPending,
            PressDuration::Short => ProvisioningState::CapturingCredentials,
        }
    }

    fn factory_reset_pending_state(&mut self) -> Result<Outcome> {
        self.indicator.show(Cue::FactoryReset);
        self.prefs.wipe(OPERATING_NAMESPACE)?;
        self.prefs.wipe(PERIPHERAL_NAMESPACE)?;
        info!("Factory reset complete, restart required");
        Ok(Outcome::FactoryReset)
    }

    // Existing keys are overwritten field by field; the namespace is not wiped first.
    async fn capturing_credentials_state(&mut self) -> Result<ProvisioningState> {
        let record = portal::capture_credentials(
            self.access_point,
            self.transport,
            self.delay,
            self.ap_config,
        )
        .await?;
        let mut namespace = self.prefs.begin(OPERATING_NAMESPACE, Access::ReadWrite)?;
        config::store_record(&mut namespace, &record)?;
        namespace.end()?;
        self.indicator.show(Cue::CredentialsReceived);
        Ok(ProvisioningState::Complete)
    }

    fn complete_state(&mut self) -> Result<Outcome> {
        config::record_firmware_version(self.prefs)?;
        let operating = OperatingConfig::load(self.prefs)?;
        info!(
            "Provisioned: channel {} of {}, poll {} ms",
            operating.active_tally_channel, operating.max_tally_channel, operating.poll_interval_ms
        );
        Ok(Outcome::Operating(operating))
    }
}
