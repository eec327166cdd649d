/// Saved mixture snapshot and the ten-entry most-recent-first list
pub mod mixture;
/// Storage error type, the `MixtureBackend` trait and the strategy chosen from the
/// configuration (cloud or local)
pub mod backend;
/// Key-value persistence for local mode and for the cloud read fallback
pub mod local_store;
pub mod local_backend;
/// REST client for the remote document database
pub mod appwrite_client;
/// Mixtures as remote documents owned by a user
pub mod cloud_backend;
/// Front door used by the UI: save, load, delete and clear mixtures
///
///  # Examples
/// ```no_run
/// use VirtualLab::Storage::mixture_store::MixtureStore;
/// use VirtualLab::settings::LabConfig;
/// let mut store = MixtureStore::from_config(&LabConfig::default()).unwrap();
/// for mixture in store.load() {
///     println!("{} {}", mixture.name, mixture.color);
/// }
/// ```
pub mod mixture_store;
