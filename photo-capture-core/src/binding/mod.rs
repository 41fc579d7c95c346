pub mod sink_binder;
