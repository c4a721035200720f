mod test_ws_connector;
