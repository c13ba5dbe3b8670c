mod outline_tests;
