mod install_session;
mod migration;
mod rename_sync;
