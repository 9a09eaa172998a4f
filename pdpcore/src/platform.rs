use crate::traits::PolicyBackend;

pub trait PlatformUrl {
    fn url(&self) -> &str;
}

/// PDPlatform - Policy Decision Platform
///
/// The durable side of the policy engine.  This trait is applicable to
/// everything that correctly implements the relevant backends that
/// compose this trait and opts in through [`DefaultPDPlatform`].
pub trait PDPlatform: PolicyBackend
    + PlatformUrl

    + Send
    + Sync
{
    fn as_dyn(&self) -> &dyn PDPlatform;
}

pub trait DefaultPDPlatform {}

impl<P: PolicyBackend
    + PlatformUrl

    + DefaultPDPlatform

    + Send
    + Sync
> PDPlatform for P {
    fn as_dyn(&self) -> &dyn PDPlatform {
        self
    }
}

mod connector;
pub use connector::ConnectorOption;
