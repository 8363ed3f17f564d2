mod emitter_test;
