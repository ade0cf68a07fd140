//! Release publishing pipeline
//!
//! Each step owns one concern of publishing a release and talks to the service
//! through [`PivnetClient`](crate::pivnet::PivnetClient):
//!
//! - **creator**: validate the requested release and create it
//! - **uploader**: push product files to the content store and register them
//! - **file_groups**, **dependencies**, **upgrade_paths**: synchronous associations
//! - **references**: image, artifact and helm chart references
//! - **poller**: replication wait for image and artifact references
//! - **user_groups**: availability and user group access
//! - **finalizer**: read the release back and build the response
//!
//! Steps never retry and never undo earlier steps; the first error ends the publish.

pub mod creator;
pub mod dependencies;
pub mod file_groups;
pub mod finalizer;
pub mod poller;
pub mod references;
pub mod upgrade_paths;
pub mod uploader;
pub mod user_groups;

pub use creator::ReleaseCreator;
pub use dependencies::{DependenciesAdder, DependencySpecifiersAdder};
pub use file_groups::FileGroupsAdder;
pub use finalizer::{ReleaseFinalizer, metadata_pairs};
pub use poller::{Clock, ReplicationPoller, SystemClock};
pub use references::{ArtifactReferencesAdder, HelmChartReferencesAdder, ImageReferencesAdder};
pub use upgrade_paths::{UpgradePathSpecifiersAdder, UpgradePathsAdder};
pub use uploader::{ContentStore, ReleaseUploader};
pub use user_groups::UserGroupsUpdater;
