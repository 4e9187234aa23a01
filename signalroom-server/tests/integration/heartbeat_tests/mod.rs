mod test_unresponsive_socket;
